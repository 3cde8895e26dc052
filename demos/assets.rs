//! Asset loading walkthrough: a pool serving vertex buffers of varying
//! sizes, with memory dumps along the way.
//!
//! Run with `cargo run --example assets`. Two dump files are written to
//! the current directory so the page layout can be inspected before and
//! after the frees.

use std::{fs::File, mem, ptr::NonNull};

use pagepool::{PagePool, KILO};

/// Mimics a vertex the way mesh files lay them out: a position and a
/// texture coordinate.
#[repr(C)]
#[derive(Clone, Copy)]
struct Vertex {
    position: [f32; 3],
    uv: [f32; 2],
}

const VERTEX_SIZE: usize = mem::size_of::<Vertex>();

/// Allocates a vertex buffer from the pool and fills it with a generated
/// fan of vertices, like a loader parsing a mesh file would.
fn load_mesh(pool: &mut PagePool, vertex_count: usize) -> NonNull<Vertex> {
    let ptr = pool
        .allocate(vertex_count * VERTEX_SIZE)
        .expect("mesh exceeds page size")
        .cast::<Vertex>();

    for i in 0..vertex_count {
        let angle = i as f32;
        let vertex = Vertex {
            position: [angle.cos(), angle.sin(), 0.0],
            uv: [i as f32 / vertex_count as f32, 0.5],
        };
        unsafe { ptr.as_ptr().add(i).write(vertex) };
    }

    println!(
        "loaded mesh with {vertex_count:3} vertices ({:4} bytes) at {:?}",
        vertex_count * VERTEX_SIZE,
        ptr
    );

    ptr
}

fn main() {
    // 5 KiB pages; the threshold is roughly the smallest asset we'll
    // allocate, so leftovers smaller than one vertex aren't split off.
    let mut pool = PagePool::new(5 * KILO, VERTEX_SIZE);

    // A single vertex, then a couple of real buffers.
    let single = load_mesh(&mut pool, 1);
    let quad = load_mesh(&mut pool, 4);
    let fan = load_mesh(&mut pool, 10);

    let mut before = File::create("assets_before.txt").expect("cannot create dump file");
    pool.dump(&mut before).expect("dump failed");
    println!("wrote assets_before.txt");

    // Release the middle buffer, leaving a hole between its neighbors.
    // The next mesh is carved from the biggest free block, the page tail,
    // so the hole stays open for a smaller asset.
    unsafe { pool.free(quad.cast()) };
    let bigger = load_mesh(&mut pool, 40);

    // The page tail now holds 3856 bytes. Requesting 192 vertices (3840
    // bytes) leaves only 16 bytes of headroom, below the threshold plus
    // a header, so instead of splitting off a useless sliver the pool
    // hands out the whole block: the dump shows this mesh owning 3856
    // bytes, with the spare 16 riding along until the buffer is freed.
    let packed = load_mesh(&mut pool, 192);

    // This one doesn't fit into what's left of page 0 anymore, so the
    // pool grows.
    let huge = load_mesh(&mut pool, 200);
    println!("pool now holds {} page(s)", pool.page_count());

    unsafe {
        pool.free(single.cast());
        pool.free(fan.cast());
        pool.free(bigger.cast());
        pool.free(packed.cast());
        pool.free(huge.cast());
    }

    let mut after = File::create("assets_after.txt").expect("cannot create dump file");
    pool.dump(&mut after).expect("dump failed");
    println!("wrote assets_after.txt");
}
