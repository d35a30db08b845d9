//! Pollard-rho (Brent variant) factorization of the handshake's `pq`.

fn gcd(mut a: u128, mut b: u128) -> u128 {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}

/// Finds a non-trivial divisor of `n` with the polynomial `x² + c`, if the
/// walk does not collapse onto `n` itself.
fn brent(n: u128, c: u128) -> Option<u128> {
    const BATCH: u64 = 128;
    let step = |x: u128| (x * x + c) % n;

    let mut y  = 2u128;
    let mut x  = y;
    let mut ys = y;
    let mut q  = 1u128;
    let mut g  = 1u128;
    let mut r  = 1u64;

    while g == 1 {
        x = y;
        for _ in 0..r { y = step(y); }
        let mut k = 0;
        while k < r && g == 1 {
            ys = y;
            for _ in 0..BATCH.min(r - k) {
                y = step(y);
                q = q * x.abs_diff(y) % n;
            }
            g = gcd(q, n);
            k += BATCH;
        }
        r *= 2;
    }

    // The batched product overshot; walk back one step at a time.
    if g == n {
        loop {
            ys = step(ys);
            g = gcd(x.abs_diff(ys), n);
            if g > 1 { break; }
        }
    }

    (g != n).then_some(g)
}

/// Splits `pq` into `(p, q)` with `p <= q`.
///
/// Returns `None` when `pq` is prime or too small to split.
pub fn factorize(pq: u64) -> Option<(u64, u64)> {
    if pq < 4 {
        return None;
    }
    if pq % 2 == 0 {
        return Some((2, pq / 2));
    }
    let n = pq as u128;
    [1u128, 3, 5, 7, 11, 13, 17, 19, 23]
        .into_iter()
        .find_map(|c| brent(n, c))
        .map(|d| {
            let (a, b) = (d as u64, (n / d) as u64);
            (a.min(b), a.max(b))
        })
}
