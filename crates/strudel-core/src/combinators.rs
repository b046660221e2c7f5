use crate::{Fraction, Hap, Pattern, State, TimeSpan, Value};
use std::sync::Arc;

/// Create a pattern with a single constant value
///
/// Yields one Hap per cycle the query touches, each with `whole = (C, C+1)`
/// for the cycle `C` it falls in and `part = whole ∩ query`. Splitting at
/// cycle boundaries this way (rather than taking the raw query span as the
/// whole) is what keeps `pure` consistent under locality: querying `(0.5,
/// 1.5)` in one call must agree with querying `(0.5, 1)` and `(1, 1.5)`
/// separately.
pub fn pure(value: Value) -> Pattern {
    Pattern::new(move |state| {
        state
            .span
            .span_cycles()
            .into_iter()
            .filter(|part| !part.is_empty())
            .map(|part| {
                let cycle = part.begin.floor();
                let whole = TimeSpan::new(cycle, cycle + Fraction::from_int(1));
                Hap::new(Some(whole), part, value.clone())
            })
            .collect()
    })
}

/// Build a continuous signal from a function of time.
///
/// Unlike `pure`, a signal has no `whole` — it represents a continuously
/// varying value (e.g. an LFO) rather than a discrete onset. Each query
/// span is split at cycle boundaries and sampled once per resulting
/// sub-span, at its midpoint, so that the same query always produces the
/// same samples.
pub fn signal<F>(f: F) -> Pattern
where
    F: Fn(Fraction) -> Value + Send + Sync + 'static,
{
    Pattern::new(move |state| {
        state
            .span
            .span_cycles()
            .into_iter()
            .filter(|part| !part.is_empty())
            .map(|part| Hap::new(None, part, f(part.midpoint())))
            .collect()
    })
}

/// Create an empty/silent pattern
///
/// Returns no events for any query
pub fn silence() -> Pattern {
    Pattern::new(|_state| Vec::new())
}

/// Concatenate patterns, switching between them successively per cycle
///
/// This is also known as "slowcat" - each pattern plays for one full cycle
pub fn slowcat(patterns: Vec<Pattern>) -> Pattern {
    if patterns.is_empty() {
        return silence();
    }

    if patterns.len() == 1 {
        return patterns.into_iter().next().unwrap();
    }

    let pat_count = patterns.len() as i64;
    let patterns_rc = Arc::new(patterns);

    // Calculate LCM of all pattern steps
    let steps = patterns_rc
        .iter()
        .filter_map(|p| p.get_steps())
        .reduce(|acc, s| {
            let lcm_val = Fraction::lcm(
                acc.numerator * s.denominator,
                s.numerator * acc.denominator,
            );
            Fraction::new(lcm_val / acc.denominator, s.denominator)
        });

    Pattern::with_steps(
        move |state| {
            let span = state.span;

            // Calculate which pattern to use based on the cycle
            let begin_cycle = span.begin.floor().numerator;
            let pat_n = ((begin_cycle % pat_count) + pat_count) % pat_count; // Handle negative cycles

            if let Some(pat) = patterns_rc.get(pat_n as usize) {
                // Calculate offset to make pattern cycles line up correctly
                let cycle_offset = Fraction::from_int(begin_cycle)
                    - (Fraction::from_int(begin_cycle / pat_count) * Fraction::from_int(pat_count));

                // Query the pattern with adjusted timespan
                let adjusted_span = TimeSpan::new(span.begin - cycle_offset, span.end - cycle_offset);
                let adjusted_state = state.set_span(adjusted_span);

                pat.query(adjusted_state)
                    .into_iter()
                    .map(|hap| {
                        hap.with_span(|ts| {
                            TimeSpan::new(ts.begin + cycle_offset, ts.end + cycle_offset)
                        })
                    })
                    .collect()
            } else {
                Vec::new()
            }
        },
        steps,
    )
    .split_queries()
}

/// Concatenate patterns, cramming them all into one cycle
///
/// This is also known as "fastcat" or "sequence" - plays all patterns
/// within a single cycle
pub fn fastcat(patterns: Vec<Pattern>) -> Pattern {
    if patterns.is_empty() {
        return silence();
    }

    if patterns.len() == 1 {
        return patterns.into_iter().next().unwrap();
    }

    let pat_count = patterns.len();
    let mut result = slowcat(patterns);

    // Speed up by the number of patterns
    result = result.with_query_time(move |t| t * Fraction::from_int(pat_count as i64));
    result = result.with_hap_time(move |t| t / Fraction::from_int(pat_count as i64));

    result.set_steps(Some(Fraction::from_int(pat_count as i64)))
}

/// Alias for fastcat
pub fn sequence(patterns: Vec<Pattern>) -> Pattern {
    fastcat(patterns)
}

/// Compress a pattern into the sub-span `[begin, end)` of every cycle,
/// silencing it outside that window. The building block `fastcat_weighted`
/// uses to give mini-notation's `@` weight post-operator unequal slot sizes
/// within a sequence, rather than the equal `1/n` fastcat gives each child.
fn compress(pattern: Pattern, begin: Fraction, end: Fraction) -> Pattern {
    if begin >= end || begin < Fraction::from_int(0) || end > Fraction::from_int(1) {
        return silence();
    }
    let dur = end - begin;

    Pattern::new(move |state: State| {
        let span = state.span;
        let cycle = span.begin.floor();
        let window = TimeSpan::new(cycle + begin, cycle + end);
        let Some(clipped) = span.intersection(&window) else {
            return Vec::new();
        };
        if clipped.is_empty() {
            return Vec::new();
        }

        let to_inner = move |t: Fraction| cycle + (t - (cycle + begin)) / dur;
        let inner_span = TimeSpan::new(to_inner(clipped.begin), to_inner(clipped.end));
        let inner_state = state.set_span(inner_span);

        pattern
            .query(inner_state)
            .into_iter()
            .map(move |hap| {
                hap.with_span(|ts| {
                    let from_inner = move |t: Fraction| cycle + begin + (t - cycle) * dur;
                    TimeSpan::new(from_inner(ts.begin), from_inner(ts.end))
                })
            })
            .collect()
    })
    .split_queries()
}

/// Sequence patterns into one cycle with each child given a slot
/// proportional to its weight instead of an equal `1/n` share.
///
/// Mirrors [`fastcat`] when every weight is equal; this is what mini
/// notation's `@` post-operator lowers to (`a@3 b` gives `a` three-quarters
/// of the cycle).
pub fn fastcat_weighted(weighted: Vec<(Pattern, f64)>) -> Pattern {
    if weighted.is_empty() {
        return silence();
    }
    if weighted.len() == 1 {
        return weighted.into_iter().next().unwrap().0;
    }

    let total_weight: f64 = weighted.iter().map(|(_, w)| w.max(0.0)).sum();
    if total_weight <= 0.0 {
        return fastcat(weighted.into_iter().map(|(p, _)| p).collect());
    }

    let last = weighted.len() - 1;
    let mut begin = 0.0_f64;
    let mut compressed = Vec::with_capacity(weighted.len());
    for (i, (pat, w)) in weighted.into_iter().enumerate() {
        let w = w.max(0.0);
        // Clamp the final slot to exactly 1.0 so cumulative float error in
        // the running sum can never push it past the cycle boundary, which
        // would make `compress` silently drop the last pattern's events.
        let end = if i == last { 1.0 } else { (begin + w / total_weight).min(1.0) };
        compressed.push(compress(pat, Fraction::from_float(begin), Fraction::from_float(end)));
        begin = end;
    }

    stack(compressed).set_steps(Some(Fraction::from_float(total_weight)))
}

/// Stack/layer multiple patterns on top of each other
///
/// All patterns play simultaneously (polyrhythm)
pub fn stack(patterns: Vec<Pattern>) -> Pattern {
    if patterns.is_empty() {
        return silence();
    }

    if patterns.len() == 1 {
        return patterns.into_iter().next().unwrap();
    }

    let patterns_rc = Arc::new(patterns);

    // Calculate LCM of all pattern steps
    let steps = patterns_rc
        .iter()
        .filter_map(|p| p.get_steps())
        .reduce(|acc, s| {
            let lcm_val = Fraction::lcm(
                acc.numerator * s.denominator,
                s.numerator * acc.denominator,
            );
            Fraction::new(lcm_val / acc.denominator, s.denominator)
        });

    Pattern::with_steps(
        move |state| {
            patterns_rc
                .iter()
                .flat_map(|pat| pat.query(state.clone()))
                .collect()
        },
        steps,
    )
}

/// Alias for stack
pub fn polyrhythm(patterns: Vec<Pattern>) -> Pattern {
    stack(patterns)
}

/// Polymeter - play patterns with different step counts simultaneously
///
/// Each pattern is sped up proportionally so they all complete
/// their cycles at the same time based on LCM of step counts.
///
/// For example, `{bd sd, hh oh cp}`:
/// - Pattern 1 has 2 steps, Pattern 2 has 3 steps
/// - LCM(2, 3) = 6 steps
/// - Pattern 1 plays 3 times (2 * 3 = 6)
/// - Pattern 2 plays 2 times (3 * 2 = 6)
pub fn polymeter(patterns: Vec<Pattern>) -> Pattern {
    polymeter_with_steps(patterns, None)
}

/// Polymeter with an explicit target step count (mini notation's `{...}%n`),
/// overriding the default of LCM-of-children's-steps. Per the spec, the
/// common `steps` is consumed by alignment-sensitive combinators; here it
/// sets how many steps each cycle of the combined pattern holds.
pub fn polymeter_with_steps(patterns: Vec<Pattern>, steps: Option<i64>) -> Pattern {
    if patterns.is_empty() {
        return silence();
    }

    if patterns.len() == 1 && steps.is_none() {
        return patterns.into_iter().next().unwrap();
    }

    // Get step counts for each pattern
    let step_counts: Vec<i64> = patterns
        .iter()
        .map(|p| p.get_steps().map(|f| f.numerator).unwrap_or(1))
        .collect();

    // Explicit steps win; otherwise default to the LCM of all children.
    let total_steps = steps.unwrap_or_else(|| {
        step_counts
            .iter()
            .fold(1, |acc, &s| Fraction::lcm(acc, s))
    });

    // Speed up each pattern proportionally
    let adjusted_patterns: Vec<Pattern> = patterns
        .into_iter()
        .zip(step_counts.iter())
        .map(|(pat, &steps)| {
            let speed_factor = (total_steps as f64) / (steps as f64);
            pat.fast(speed_factor)
        })
        .collect();

    // Stack the adjusted patterns
    stack(adjusted_patterns).set_steps(Some(Fraction::from_int(total_steps)))
}

/// Choose - randomly select one pattern per cycle
///
/// Uses seed for deterministic selection based on cycle number.
/// Each cycle will consistently choose the same pattern for the same seed.
pub fn choose(patterns: Vec<Pattern>, seed: u64) -> Pattern {
    if patterns.is_empty() {
        return silence();
    }

    if patterns.len() == 1 {
        return patterns.into_iter().next().unwrap();
    }

    let patterns_rc = Arc::new(patterns);
    let pat_count = patterns_rc.len();

    Pattern::new(move |state| {
        // One choice per cycle, hashed from (seed, cycle) so the same cycle
        // always picks the same child regardless of how the query is split.
        let cycle = state.span.begin.floor().numerator;
        let unit = crate::rng::unit_interval(seed, cycle, 0);
        let choice = ((unit * pat_count as f64) as usize).min(pat_count - 1);

        patterns_rc[choice].query(state)
    })
    .split_queries()
}

/// Choose with weights - randomly select one pattern per cycle using weighted probabilities
///
/// Uses seed for deterministic selection based on cycle number.
/// Weights determine the relative probability of selecting each pattern.
///
/// # Arguments
/// * `patterns_with_weights` - Vector of (pattern, weight) tuples
/// * `seed` - Random seed for deterministic selection
///
/// # Examples
/// ```
/// use strudel_core::{pure, Value, choose_weighted};
///
/// let bd = pure(Value::String("bd".into()));
/// let sd = pure(Value::String("sd".into()));
/// let cp = pure(Value::String("cp".into()));
///
/// // bd is 2x more likely to be selected than sd or cp
/// let pattern = choose_weighted(vec![(bd, 2.0), (sd, 1.0), (cp, 1.0)], 0);
/// ```
pub fn choose_weighted(patterns_with_weights: Vec<(Pattern, f64)>, seed: u64) -> Pattern {
    if patterns_with_weights.is_empty() {
        return silence();
    }

    if patterns_with_weights.len() == 1 {
        return patterns_with_weights.into_iter().next().unwrap().0;
    }

    let patterns: Vec<Pattern> = patterns_with_weights.iter().map(|(p, _)| p.clone()).collect();
    let weights: Vec<f64> = patterns_with_weights.iter().map(|(_, w)| *w).collect();

    let patterns_rc = Arc::new(patterns);
    let weights_rc = Arc::new(weights);

    Pattern::new(move |state| {
        let cycle = state.span.begin.floor().numerator;
        let unit = crate::rng::unit_interval(seed, cycle, 0);

        let total_weight: f64 = weights_rc.iter().sum();

        if total_weight <= 0.0 {
            let choice = ((unit * patterns_rc.len() as f64) as usize).min(patterns_rc.len() - 1);
            return patterns_rc[choice].query(state);
        }

        let target = unit * total_weight;
        let mut cumulative = 0.0;
        for (i, weight) in weights_rc.iter().enumerate() {
            cumulative += weight;
            if target < cumulative {
                return patterns_rc[i].query(state);
            }
        }

        // Fallback for floating point edge cases at the top of the range.
        patterns_rc[patterns_rc.len() - 1].query(state)
    })
    .split_queries()
}
