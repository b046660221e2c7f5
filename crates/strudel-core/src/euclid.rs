/// Euclidean rhythm generation using the Bjorklund algorithm
///
/// This module implements the Bjorklund algorithm for generating
/// Euclidean rhythms, which distributes pulses as evenly as possible
/// across a given number of steps.
/// Generate a Euclidean rhythm pattern using the Bjorklund algorithm
///
/// # Arguments
/// * `pulse` - Number of pulses (onsets) in the pattern
/// * `step` - Total number of steps in the pattern
/// * `rotation` - Number of steps to rotate the pattern
///
/// # Returns
/// A vector of booleans where `true` represents a pulse and `false` represents a rest
///
/// # Examples
/// ```
/// use strudel_core::euclid::bjorklund;
///
/// // Classic 3-against-8 pattern
/// let pattern = bjorklund(3, 8, 0);
/// assert_eq!(pattern.len(), 8);
/// assert_eq!(pattern.iter().filter(|&&x| x).count(), 3);
/// ```
pub fn bjorklund(pulse: usize, step: usize, rotation: usize) -> Vec<bool> {
    // Edge cases
    if step == 0 {
        return Vec::new();
    }

    if pulse == 0 {
        return vec![false; step];
    }

    if pulse >= step {
        return vec![true; step];
    }

    // Two work lists, `a` of groups starting with a pulse and `b` of groups
    // starting with a rest. Each round pairs off the shorter list against a
    // prefix of the longer one, folding a rest onto the tail of each pulse
    // group; what's left of the longer list (never the shorter) carries
    // over into the next round. Stopping once `b` holds at most one group
    // is what keeps the distribution maximally even instead of lumping the
    // remainder onto one end.
    let mut a: Vec<Vec<bool>> = vec![vec![true]; pulse];
    let mut b: Vec<Vec<bool>> = vec![vec![false]; step - pulse];

    while b.len() > 1 {
        let n = a.len().min(b.len());
        let mut new_a = Vec::with_capacity(n);
        for i in 0..n {
            let mut combined = a[i].clone();
            combined.extend_from_slice(&b[i]);
            new_a.push(combined);
        }
        let mut new_b = a[n..].to_vec();
        new_b.extend(b[n..].iter().cloned());
        a = new_a;
        b = new_b;
    }

    let mut result: Vec<bool> = a.into_iter().chain(b).flatten().collect();

    // Apply rotation
    if rotation > 0 && !result.is_empty() {
        let rot = rotation % result.len();
        result.rotate_left(rot);
    }

    result
}
