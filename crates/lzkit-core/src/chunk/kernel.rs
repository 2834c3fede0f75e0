//! Width-generic chunk algorithms, instantiated once per engine.
//!
//! Everything here is `#[inline(always)]` so that it is compiled inside the
//! engine's `#[target_feature]` wrapper.

use super::{copy_block, Chunk};

/// Forward copy of `len` bytes: whole chunks first, then 16/8/4/2/1-byte steps.
///
/// Each step reads and writes at most `min(len, C::SIZE)` bytes, so the result
/// equals a byte-by-byte forward copy whenever `src` and `dst` are at least
/// that far apart.
#[inline(always)]
unsafe fn copy_forward<C: Chunk>(window: &mut [u8], mut dst: usize, mut src: usize, mut len: usize) -> usize {
    while len >= C::SIZE {
        C::load(&window[src..]).store(&mut window[dst..]);
        dst += C::SIZE;
        src += C::SIZE;
        len -= C::SIZE;
    }
    if len >= 16 {
        copy_block::<16>(window, dst, src);
        dst += 16;
        src += 16;
        len -= 16;
    }
    if len >= 8 {
        copy_block::<8>(window, dst, src);
        dst += 8;
        src += 8;
        len -= 8;
    }
    if len >= 4 {
        copy_block::<4>(window, dst, src);
        dst += 4;
        src += 4;
        len -= 4;
    }
    if len >= 2 {
        copy_block::<2>(window, dst, src);
        dst += 2;
        src += 2;
        len -= 2;
    }
    if len == 1 {
        window[dst] = window[src];
        dst += 1;
    }
    dst
}

#[inline(always)]
pub(crate) unsafe fn copy<C: Chunk>(window: &mut [u8], dst: usize, src: usize, len: usize) -> usize {
    debug_assert!(
        dst.abs_diff(src) >= C::SIZE.min(len),
        "chunk copy ranges closer than one chunk"
    );
    copy_forward::<C>(window, dst, src, len)
}

/// Overlap-aware copy bounded by the inclusive index `safe`.
///
/// When the ranges overlap, the copy proceeds in blocks of the non-overlap
/// distance so every block reads only bytes that are already final.
#[inline(always)]
pub(crate) unsafe fn copy_safe<C: Chunk>(
    window: &mut [u8],
    mut dst: usize,
    mut src: usize,
    len: usize,
    safe: usize,
) -> usize {
    let mut len = len.min((safe + 1).saturating_sub(dst));
    let overlaps = (src >= dst && src < dst + len) || (dst >= src && dst < src + len);
    if !overlaps {
        return copy_forward::<C>(window, dst, src, len);
    }
    if src == dst {
        return dst + len;
    }

    let block = src.abs_diff(dst);
    while len > 0 {
        let step = block.min(len);
        dst = copy_forward::<C>(window, dst, src, step);
        src += step;
        len -= step;
    }
    dst
}

/// Rewrite a short distance into a chunk-sized one by doubling the pattern in
/// place, or emit a single chunk for `C::SIZE <= dist < 2 * C::SIZE`.
///
/// May store up to `C::SIZE` bytes past `dst + len`.
#[inline(always)]
pub(crate) unsafe fn unroll<C: Chunk>(
    window: &mut [u8],
    mut dst: usize,
    dist: &mut usize,
    len: &mut usize,
) -> usize {
    let src = dst - *dist;
    while *dist < *len && *dist < C::SIZE {
        C::load(&window[src..]).store(&mut window[dst..]);
        dst += *dist;
        *len -= *dist;
        *dist += *dist;
    }
    if *dist >= C::SIZE && *dist < 2 * C::SIZE && *len >= 2 * C::SIZE {
        C::load(&window[dst - *dist..]).store(&mut window[dst..]);
        dst += C::SIZE;
        *len -= C::SIZE;
    }
    dst
}

#[inline(always)]
pub(crate) unsafe fn memset_fill<C: Chunk>(window: &mut [u8], mut dst: usize, dist: usize, mut len: usize) -> usize {
    debug_assert!(dist > 0 && dist <= dst, "fill distance outside the window");
    let src = dst - dist;

    if len < C::SIZE {
        return fill_bytewise(window, dst, dist, len);
    }

    let chunk = match dist {
        1 | 2 | 4 | 8 => C::broadcast(&window[src..], dist),
        d if d == C::SIZE => C::load(&window[src..]),
        d if d < C::SIZE => return fill_widening::<C>(window, dst, dist, len),
        _ => {
            let mut dist = dist;
            dst = unroll::<C>(window, dst, &mut dist, &mut len);
            return copy::<C>(window, dst, dst - dist, len);
        }
    };

    let rem = len % C::SIZE;
    len -= rem;
    while len > 0 {
        chunk.store(&mut window[dst..]);
        dst += C::SIZE;
        len -= C::SIZE;
    }
    // The pattern period divides the chunk width, so the tail repeats the
    // previous chunk's leading bytes.
    if rem > 0 {
        window.copy_within(dst - C::SIZE..dst - C::SIZE + rem, dst);
        dst += rem;
    }
    dst
}

/// Fill for a period that is shorter than a chunk and not a broadcast width.
///
/// The replicated prefix doubles with exact, non-overlapping copies until the
/// distance reaches a chunk; the rest is a plain chunk copy. Nothing is written
/// past `dst + len`.
#[inline(always)]
unsafe fn fill_widening<C: Chunk>(window: &mut [u8], mut dst: usize, mut dist: usize, mut len: usize) -> usize {
    while dist < C::SIZE && dist <= len {
        dst = copy_forward::<C>(window, dst, dst - dist, dist);
        len -= dist;
        dist *= 2;
    }
    copy::<C>(window, dst, dst - dist, len)
}

#[inline(always)]
pub(crate) unsafe fn memset_fill_safe<C: Chunk>(
    window: &mut [u8],
    dst: usize,
    dist: usize,
    len: usize,
    left: usize,
) -> usize {
    let len = len.min(left);
    if left < 3 * C::SIZE {
        return fill_bytewise(window, dst, dist, len);
    }
    memset_fill::<C>(window, dst, dist, len)
}

#[inline(always)]
fn fill_bytewise(window: &mut [u8], mut dst: usize, dist: usize, len: usize) -> usize {
    for _ in 0..len {
        window[dst] = window[dst - dist];
        dst += 1;
    }
    dst
}
