use avlkit::trace::TraceBuffer;
use avlkit::{AvlTree, DebugAvlTree};
use itertools::Itertools;
use rand::prelude::*;
use rand_pcg::Pcg64;

const SEED: u64 = 54783;

fn replay(title: &str, keys: &[i32]) -> DebugAvlTree<i32, i32> {
    let trace = TraceBuffer::new();
    let mut tree = DebugAvlTree::create_with_debug_writer(trace.clone());
    for &k in keys {
        tree.insert(k, k * 10);
    }
    println!("\n--- {} ---", title);
    print!("{}", trace.borrow());
    print!("{}", tree);
    tree
}

fn ascending() {
    replay("insert 1, 2, 3", &[1, 2, 3]);
}

fn zigzag() {
    replay("insert 3, 1, 2", &[3, 1, 2]);
}

fn remove_root() {
    let mut tree = replay("insert 4, 2, 6, 1, 3, 5, 7", &[4, 2, 6, 1, 3, 5, 7]);
    tree.remove(&4);
    println!("\n--- remove 4 ---");
    print!("{}", tree);
}

fn random_workload() {
    let mut rng = Pcg64::seed_from_u64(SEED);
    let mut keys: Vec<u32> = (0..1000).collect();
    keys.shuffle(&mut rng);

    let mut tree = AvlTree::new();
    for &k in &keys {
        tree.insert(k, rng.random_range(0..100u32));
    }
    for &k in keys.iter().filter(|k| *k % 3 != 0) {
        tree.remove(&k);
    }

    println!("\n--- random workload ---");
    println!("len: {}, height: {}", tree.len(), tree.height());
    println!("first keys: {}", tree.keys().take(10).join(", "));
    match tree.check_invariants() {
        Ok(()) => println!("invariants hold"),
        Err(violation) => println!("invariant violated: {}", violation),
    }
}

pub fn main() {
    ascending();
    zigzag();
    remove_root();
    random_workload();
}
