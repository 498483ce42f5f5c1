//! Peak heap use of the batched k-NN average.
//!
//! This lives in its own test binary because it swaps in a counting global allocator, and any
//! other test running at the same time would show up in the counts.

extern crate ndarray;
extern crate wordbridge;

use std::alloc::{GlobalAlloc, Layout, System};
use std::sync::atomic::{AtomicUsize, Ordering};
use ndarray::Array2;

use wordbridge::similarity::nn_avg_dist;

struct Counting;

static CURRENT: AtomicUsize = AtomicUsize::new(0);
static PEAK: AtomicUsize = AtomicUsize::new(0);

unsafe impl GlobalAlloc for Counting {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        let ptr = System.alloc(layout);
        if !ptr.is_null() {
            let now = CURRENT.fetch_add(layout.size(), Ordering::SeqCst) + layout.size();
            PEAK.fetch_max(now, Ordering::SeqCst);
        }
        ptr
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        System.dealloc(ptr, layout);
        CURRENT.fetch_sub(layout.size(), Ordering::SeqCst);
    }
}

#[global_allocator]
static ALLOCATOR: Counting = Counting;

fn table(rows: usize, dim: usize, seed: usize) -> Array2<f64> {
    Array2::from_shape_fn((rows, dim), |(i, j)| (((i * 31 + j * 17 + seed) % 97) as f64 - 48.0) / 48.0)
}

#[test]
fn test_only_one_batch_of_scores_at_a_time() {
    let query = table(2048, 4, 1);
    let reference = table(20000, 4, 2);
    // Start the thread pool before measuring
    nn_avg_dist(query.view(), reference.view(), 5, 64).unwrap();

    let one_batch = 64 * reference.nrows() * 8;
    let baseline = CURRENT.load(Ordering::SeqCst);
    PEAK.store(baseline, Ordering::SeqCst);
    let avg = nn_avg_dist(query.view(), reference.view(), 5, 64).unwrap();
    let growth = PEAK.load(Ordering::SeqCst) - baseline;

    assert_eq!(avg.len(), 2048);
    assert!(growth < one_batch + one_batch / 2,
            "one batch is {} bytes but the heap grew by {}", one_batch, growth);
}
