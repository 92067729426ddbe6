use std::num::NonZeroUsize;

use token_rates::batch::{batch_count, batches};

fn size(n: usize) -> NonZeroUsize {
    NonZeroUsize::new(n).unwrap()
}

#[test]
fn test_batches_preserve_order_and_size() {
    for len in 0..=250 {
        let items: Vec<usize> = (0..len).collect();
        for &batch_size in &[1, 3, 7, 100] {
            let produced: Vec<&[usize]> = batches(&items, size(batch_size)).collect();

            assert_eq!(produced.len(), (len + batch_size - 1) / batch_size);
            assert_eq!(produced.len(), batch_count(len, size(batch_size)));
            assert_eq!(produced.concat(), items);
            if let Some((_, full)) = produced.split_last() {
                assert!(full.iter().all(|batch| batch.len() == batch_size));
            }
        }
    }
}

#[test]
fn test_empty_input_yields_no_batches() {
    let items: Vec<String> = Vec::new();
    assert_eq!(batches(&items, size(100)).count(), 0);
}

#[test]
fn test_short_input_yields_single_batch() {
    let items = vec!["0xa", "0xb", "0xc"];
    let produced: Vec<&[&str]> = batches(&items, size(100)).collect();
    assert_eq!(produced, vec![&items[..]]);
}
