//! Run each allocation workload for a number of rounds and report the
//! average time per operation.

use std::time::{Duration, Instant};

use cairn_bench::{bench_heap, Workload, ROUNDS};

fn main() {
    println!("=== Cairn memgrind ===\n");

    let mut totals = [(Duration::ZERO, 0usize); 3];
    for round in 0..ROUNDS {
        for (slot, workload) in Workload::all(round as u64).into_iter().enumerate() {
            let mut heap = bench_heap().unwrap();
            let start = Instant::now();
            let ops = workload.run(&mut heap).unwrap();
            totals[slot].0 += start.elapsed();
            totals[slot].1 += ops;
        }
    }

    for (workload, (elapsed, ops)) in Workload::all(0).iter().zip(totals) {
        let per_op = elapsed.as_secs_f64() / ops.max(1) as f64;
        println!(
            "{:<10} {ROUNDS} rounds, {ops:>6} ops, average {:.9} s per operation",
            workload.name(),
            per_op
        );
    }
}
