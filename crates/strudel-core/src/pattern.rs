use crate::{Fraction, Hap, State, TimeSpan, Value};
use std::sync::Arc;

/// A Pattern represents a time-varying sequence of values
///
/// Patterns are queried with a State (containing a timespan) and return
/// a list of Haps (events) that occur within that timespan.
pub struct Pattern {
    /// The query function that produces events for a given state
    query_func: Arc<dyn Fn(State) -> Vec<Hap> + Send + Sync>,

    /// Optional step count (number of steps per cycle)
    steps: Option<Fraction>,
}

impl Pattern {
    /// Create a new Pattern with a query function
    pub fn new<F>(query_func: F) -> Self
    where
        F: Fn(State) -> Vec<Hap> + Send + Sync + 'static,
    {
        Pattern {
            query_func: Arc::new(query_func),
            steps: None,
        }
    }

    /// Create a new Pattern with a query function and steps
    pub fn with_steps<F>(query_func: F, steps: Option<Fraction>) -> Self
    where
        F: Fn(State) -> Vec<Hap> + Send + Sync + 'static,
    {
        Pattern {
            query_func: Arc::new(query_func),
            steps,
        }
    }

    /// Query this pattern with the given state
    pub fn query(&self, state: State) -> Vec<Hap> {
        (self.query_func)(state)
    }

    /// Get the steps for this pattern
    pub fn get_steps(&self) -> Option<Fraction> {
        self.steps
    }

    /// Set the steps for this pattern
    pub fn set_steps(mut self, steps: Option<Fraction>) -> Self {
        self.steps = steps;
        self
    }

    /// Apply a function to each value in the pattern
    ///
    /// This is the functor map operation (fmap)
    pub fn with_value<F>(self, func: F) -> Pattern
    where
        F: Fn(&crate::Value) -> crate::Value + Send + Sync + 'static,
    {
        let query_func = self.query_func.clone();
        let steps = self.steps;

        Pattern {
            query_func: Arc::new(move |state| {
                query_func(state)
                    .into_iter()
                    .map(|hap| hap.with_value(&func))
                    .collect()
            }),
            steps,
        }
    }

    /// Apply a function to query time (before querying)
    pub fn with_query_time<F>(self, func: F) -> Pattern
    where
        F: Fn(Fraction) -> Fraction + Send + Sync + 'static + Copy,
    {
        let query_func = self.query_func.clone();
        let steps = self.steps;

        Pattern {
            query_func: Arc::new(move |state| {
                let new_span = TimeSpan::new(func(state.span.begin), func(state.span.end));
                query_func(state.set_span(new_span))
            }),
            steps,
        }
    }

    /// Apply a function to hap time (after querying)
    pub fn with_hap_time<F>(self, func: F) -> Pattern
    where
        F: Fn(Fraction) -> Fraction + Send + Sync + 'static + Copy,
    {
        let query_func = self.query_func.clone();
        let steps = self.steps;

        Pattern {
            query_func: Arc::new(move |state| {
                query_func(state)
                    .into_iter()
                    .map(|hap| {
                        hap.with_span(|ts| TimeSpan::new(func(ts.begin), func(ts.end)))
                    })
                    .collect()
            }),
            steps,
        }
    }

    /// Apply a function to each hap
    pub fn with_hap<F>(self, func: F) -> Pattern
    where
        F: Fn(&Hap) -> Hap + Send + Sync + 'static,
    {
        let query_func = self.query_func.clone();
        let steps = self.steps;

        Pattern {
            query_func: Arc::new(move |state| {
                query_func(state).into_iter().map(|hap| func(&hap)).collect()
            }),
            steps,
        }
    }

    /// Apply a function to all haps at once
    pub fn with_haps<F>(self, func: F) -> Pattern
    where
        F: Fn(Vec<Hap>) -> Vec<Hap> + Send + Sync + 'static,
    {
        let query_func = self.query_func.clone();
        let steps = self.steps;

        Pattern {
            query_func: Arc::new(move |state| func(query_func(state))),
            steps,
        }
    }

    /// Split queries at cycle boundaries
    ///
    /// This is useful for patterns that need to know about cycle boundaries
    pub fn split_queries(self) -> Pattern {
        let query_func = self.query_func.clone();
        let steps = self.steps;

        Pattern {
            query_func: Arc::new(move |state| {
                let span = state.span;
                let begin_cycle = span.begin.floor();
                let end_cycle = span.end.ceil();

                let mut all_haps = Vec::new();

                let mut cycle = begin_cycle;
                while cycle < end_cycle {
                    let cycle_begin = if cycle < span.begin {
                        span.begin
                    } else {
                        cycle
                    };

                    let cycle_end = if cycle + Fraction::from_int(1) > span.end {
                        span.end
                    } else {
                        cycle + Fraction::from_int(1)
                    };

                    let cycle_span = TimeSpan::new(cycle_begin, cycle_end);
                    let cycle_state = state.set_span(cycle_span);
                    all_haps.extend(query_func(cycle_state));

                    cycle = cycle + Fraction::from_int(1);
                }

                all_haps
            }),
            steps,
        }
    }

    /// Speed up the pattern by a constant factor
    ///
    /// Multiplies the query time by the factor and divides hap times.
    /// `steps` scales by the same factor, per the steps-arithmetic rule
    /// `fast(k) ⇒ steps/k` consumed by alignment-sensitive combinators.
    pub fn fast(self, factor: f64) -> Pattern {
        let frac_factor = Fraction::from_float(factor);
        let steps = self.steps.map(|s| s / frac_factor);
        self.with_query_time(move |t| t * frac_factor)
            .with_hap_time(move |t| t / frac_factor)
            .set_steps(steps)
    }

    /// Slow down the pattern by a constant factor
    ///
    /// Divides the query time by the factor and multiplies hap times
    pub fn slow(self, factor: f64) -> Pattern {
        let frac_factor = Fraction::from_float(factor);
        let steps = self.steps.map(|s| s * frac_factor);
        self.with_query_time(move |t| t / frac_factor)
            .with_hap_time(move |t| t * frac_factor)
            .set_steps(steps)
    }

    /// Repeat each cycle n times
    ///
    /// Each source cycle is repeated n times before moving to the next.
    /// Matches Strudel's repeatCycles implementation.
    pub fn repeat_cycles(self, n: usize) -> Pattern {
        if n <= 1 {
            return self;
        }

        let query_func = self.query_func.clone();
        let steps = self.steps;
        let n_frac = Fraction::from_int(n as i64);

        Pattern {
            query_func: Arc::new(move |state| {
                // Get cycle number (floor of begin)
                let cycle = state.span.begin.floor();

                // Calculate which source cycle to use
                let source_cycle = cycle / n_frac;
                let source_cycle_floor = source_cycle.floor();

                // Calculate delta (offset from source cycle)
                let delta = cycle - source_cycle_floor;

                // Query pattern with adjusted span (subtract delta)
                let adjusted_state = state.with_span(|span| {
                    TimeSpan::new(span.begin - delta, span.end - delta)
                });

                // Query and shift results back (add delta)
                query_func(adjusted_state)
                    .into_iter()
                    .map(|hap| {
                        hap.with_span(|span| {
                            TimeSpan::new(span.begin + delta, span.end + delta)
                        })
                    })
                    .collect()
            }),
            steps,
        }
        .split_queries()
    }

    /// Replicate pattern n times within same timespan
    ///
    /// Implemented as repeatCycles(n).fast(n) to match Strudel.
    /// This repeats the entire pattern n times and speeds it up by n.
    pub fn replicate(self, n: usize) -> Pattern {
        if n == 0 {
            return Pattern::new(|_| Vec::new());
        }

        if n == 1 {
            return self;
        }

        self.repeat_cycles(n).fast(n as f64)
    }

    /// Apply a Euclidean rhythm pattern
    ///
    /// Builds the `step`-long binary pattern the Bjorklund algorithm
    /// distributes `pulse` onsets across, rotated by `rotation`, and uses it
    /// as the structure for [`Pattern::struct_`] — so `self`'s value is
    /// repeated at every `true` step, the way `bd(3,8)` repeats `bd` three
    /// times per cycle rather than sampling `self` once per step.
    pub fn euclid(self, pulse: usize, step: usize, rotation: Option<usize>) -> Pattern {
        let rot = rotation.unwrap_or(0);
        let rhythm = crate::euclid::bjorklund(pulse, step, rot);

        if rhythm.is_empty() {
            return Pattern::new(|_| Vec::new());
        }

        let binary = crate::fastcat(
            rhythm
                .into_iter()
                .map(|b| crate::pure(Value::Bool(b)))
                .collect(),
        );
        self.struct_(binary)
    }

    /// Randomly remove events with a given probability.
    ///
    /// Each hap is kept or dropped by hashing `(seed, cycle_index, hap_index)`
    /// with [`crate::rng::unit_interval`] rather than drawing from a stateful
    /// RNG, so the same query always drops the same haps regardless of how
    /// the query span was split.
    ///
    /// # Arguments
    /// * `amount` - Probability of removing each event (0.0 = keep all, 1.0 = remove all)
    /// * `seed` - Random seed for reproducibility
    pub fn degrade_by(self, amount: f64, seed: u64) -> Pattern {
        self.split_queries().with_haps(move |haps| {
            let cycle = haps
                .first()
                .map(|h| h.part.begin.floor().numerator)
                .unwrap_or(0);
            haps.into_iter()
                .enumerate()
                .filter(|(i, _)| crate::rng::unit_interval(seed, cycle, *i) >= amount)
                .map(|(_, hap)| hap)
                .collect()
        })
    }

    /// Randomly remove 50% of events
    pub fn degrade(self) -> Pattern {
        self.degrade_by(0.5, 0)
    }

    /// Map numeric values to a musical scale
    ///
    /// This is a simplified implementation that stores the scale name in context
    /// and maps numbers to notes. In the future, this could be enhanced with
    /// a proper music theory library.
    ///
    /// # Arguments
    /// * `scale_name` - Name of the scale (e.g., "C:major", "D:minor")
    ///
    /// For now, this implementation:
    /// - Stores the scale name in the event context
    /// - Converts numeric values to string notes based on a simple major scale
    pub fn scale(self, scale_name: String) -> Pattern {
        self.with_hap(move |hap| {
            // Store scale in context
            let mut new_context = hap.context.clone();
            new_context.metadata.insert("scale".to_string(), Value::String(scale_name.clone()));

            // If value is a number, map it to a note in the scale
            let new_value = match &hap.value {
                Value::Number(n) => {
                    // Simple major scale mapping: C D E F G A B
                    // This is a basic implementation - could be enhanced with proper scale theory
                    let note_names = ["C", "D", "E", "F", "G", "A", "B"];
                    let step = (*n as i32).rem_euclid(note_names.len() as i32) as usize;
                    let octave = (*n as i32).div_euclid(note_names.len() as i32) + 3; // Start at octave 3
                    Value::String(format!("{}{}", note_names[step], octave))
                }
                _ => hap.value.clone(),
            };

            Hap::with_context(hap.whole, hap.part, new_value, new_context)
        })
    }

    /// Apply a boolean/rhythm structure pattern to this pattern
    ///
    /// The structure pattern determines when events from this pattern should occur.
    /// Events are only kept where the structure pattern has truthy values.
    ///
    /// This is similar to TidalCycles/Strudel's `struct` function, which applies
    /// a rhythmic structure to a pattern. The structure pattern provides the timing,
    /// while this pattern provides the values.
    ///
    /// # Arguments
    /// * `structure` - A pattern that provides the rhythmic structure. Events from
    ///   this pattern are kept only where the structure has truthy values (non-zero
    ///   numbers, non-empty strings, true booleans, etc.)
    ///
    /// # Example
    /// ```
    /// use strudel_core::{pure, fastcat, Value};
    ///
    /// // Apply a simple on-off rhythm
    /// let values = fastcat(vec![
    ///     pure(Value::String("a".into())),
    ///     pure(Value::String("b".into())),
    ///     pure(Value::String("c".into())),
    ///     pure(Value::String("d".into())),
    /// ]);
    ///
    /// let structure = fastcat(vec![
    ///     pure(Value::Number(1.0)),  // keep
    ///     pure(Value::Number(0.0)),  // skip
    ///     pure(Value::Number(1.0)),  // keep
    ///     pure(Value::Number(0.0)),  // skip
    /// ]);
    ///
    /// let result = values.struct_(structure);
    /// // Result will only have events at positions 0 and 2
    /// ```
    pub fn struct_(self, structure: Pattern) -> Pattern {
        let value_pattern = self;
        let structure_pattern = structure;

        Pattern::new(move |state| {
            let mut result_haps = Vec::new();

            // Query the structure pattern to get the timing information
            let structure_haps = structure_pattern.query(state.clone());

            // For each structure hap, query the value pattern at that timespan
            for structure_hap in structure_haps {
                // Check if the structure value is truthy
                if is_truthy(&structure_hap.value) {
                    // Query the value pattern for this timespan
                    let value_state = state.set_span(structure_hap.whole_or_part());
                    let value_haps = value_pattern.query(value_state);

                    // For each value hap that intersects with the structure hap
                    for value_hap in value_haps {
                        if let Some(new_part) = structure_hap.part.intersection(&value_hap.part) {
                            // Create a new hap with the structure's whole timespan
                            // but the value from the value pattern
                            let new_hap = Hap::new(
                                structure_hap.whole,
                                new_part,
                                value_hap.value.clone(),
                            );
                            result_haps.push(new_hap);
                        }
                    }
                }
            }

            result_haps
        })
    }

    /// Rotate the pattern by `cycle / n` on cycle `cycle`.
    ///
    /// On cycle 0 the pattern plays unshifted; on cycle 1 it has advanced by
    /// `1/n` of a cycle; after `n` cycles it has cycled through every offset.
    pub fn iter(self, n: i64) -> Pattern {
        if n == 0 {
            return self;
        }
        let inner = self.clone();
        Pattern::new(move |state| {
            let cycle = state.span.begin.floor().numerator;
            let offset = Fraction::new(cycle.rem_euclid(n), n);
            inner.clone().early(offset.to_float()).query(state)
        })
        .split_queries()
    }

    /// Apply `f` to this pattern on every `n`-th cycle (cycle index `mod n == 0`),
    /// leaving the pattern unchanged on the other cycles.
    pub fn every<F>(self, n: i64, f: F) -> Pattern
    where
        F: Fn(Pattern) -> Pattern + Send + Sync + 'static,
    {
        if n <= 0 {
            return self;
        }
        let plain = self.clone();
        let transformed = f(self);
        Pattern::new(move |state| {
            let cycle = state.span.begin.floor().numerator;
            if cycle.rem_euclid(n) == 0 {
                transformed.query(state)
            } else {
                plain.query(state)
            }
        })
        .split_queries()
    }

    /// Keep only haps of `self` whose part overlaps a hap of `other`
    /// (regardless of the other's value) — the un-gated twin of `struct_`,
    /// where `self` supplies both structure and values.
    pub fn mask(self, other: Pattern) -> Pattern {
        let value_pattern = self;
        Pattern::new(move |state| {
            let mask_haps = other.query(state.clone());
            let mut result = Vec::new();
            for value_hap in value_pattern.query(state.clone()) {
                for mask_hap in &mask_haps {
                    if !is_truthy(&mask_hap.value) {
                        continue;
                    }
                    if let Some(part) = value_hap.part.intersection(&mask_hap.part) {
                        result.push(Hap::with_context(
                            value_hap.whole,
                            part,
                            value_hap.value.clone(),
                            value_hap.context.combine(&mask_hap.context),
                        ));
                    }
                }
            }
            result
        })
    }

    /// The complement of `mask`: keep only haps overlapping a *falsy* hap of `other`.
    pub fn invert(self) -> Pattern {
        self.with_value(|v| Value::Bool(!is_truthy(v)))
    }

    /// Applicative: combine each hap of `self` (a pattern of functions) with
    /// overlapping haps of `other`, keeping the **left** pattern's `whole`.
    pub fn app_left<F>(self, other: Pattern, combine: F) -> Pattern
    where
        F: Fn(&Value, &Value) -> Value + Send + Sync + 'static,
    {
        Pattern::new(move |state| {
            let mut result = Vec::new();
            for f_hap in self.query(state.clone()) {
                let value_state = state.set_span(f_hap.whole_or_part());
                for v_hap in other.query(value_state) {
                    if let Some(part) = f_hap.part.intersection(&v_hap.part) {
                        result.push(Hap::with_context(
                            f_hap.whole,
                            part,
                            combine(&f_hap.value, &v_hap.value),
                            f_hap.context.combine(&v_hap.context),
                        ));
                    }
                }
            }
            result
        })
    }

    /// Applicative: as [`Pattern::app_left`] but keeps the **right** pattern's `whole`.
    pub fn app_right<F>(self, other: Pattern, combine: F) -> Pattern
    where
        F: Fn(&Value, &Value) -> Value + Send + Sync + 'static,
    {
        Pattern::new(move |state| {
            let mut result = Vec::new();
            for v_hap in other.query(state.clone()) {
                let f_state = state.set_span(v_hap.whole_or_part());
                for f_hap in self.query(f_state) {
                    if let Some(part) = f_hap.part.intersection(&v_hap.part) {
                        result.push(Hap::with_context(
                            v_hap.whole,
                            part,
                            combine(&f_hap.value, &v_hap.value),
                            f_hap.context.combine(&v_hap.context),
                        ));
                    }
                }
            }
            result
        })
    }

    /// Applicative: as [`Pattern::app_left`] but the resulting `whole` is the
    /// intersection of both sides' wholes (`None` if either side is continuous).
    pub fn app_both<F>(self, other: Pattern, combine: F) -> Pattern
    where
        F: Fn(&Value, &Value) -> Value + Send + Sync + 'static,
    {
        Pattern::new(move |state| {
            let mut result = Vec::new();
            let f_haps = self.query(state.clone());
            let v_haps = other.query(state.clone());
            for f_hap in &f_haps {
                for v_hap in &v_haps {
                    let Some(part) = f_hap.part.intersection(&v_hap.part) else {
                        continue;
                    };
                    let whole = match (f_hap.whole, v_hap.whole) {
                        (Some(a), Some(b)) => a.intersection(&b),
                        _ => None,
                    };
                    result.push(Hap::with_context(
                        whole,
                        part,
                        combine(&f_hap.value, &v_hap.value),
                        f_hap.context.combine(&v_hap.context),
                    ));
                }
            }
            result
        })
    }

    /// Append another pattern to this one (list cons operator)
    ///
    /// Creates a sequence where this pattern is followed by the given pattern.
    /// Similar to fastcat([self, other]) - concatenates patterns within a cycle.
    /// This implements the ":" operator from mini notation (e.g., "a:b" becomes [a, b]).
    pub fn tail(self, other: Pattern) -> Pattern {
        crate::fastcat(vec![self, other])
    }

    /// Shift pattern in time (nudge forward or backward)
    ///
    /// Positive values shift the pattern later in time (equivalent to `late`).
    /// Negative values shift the pattern earlier in time (equivalent to `early`).
    ///
    /// This is implemented by:
    /// - Subtracting the offset from query time (asking for earlier/later events)
    /// - Adding the offset to hap time (placing events earlier/later in output)
    ///
    /// # Arguments
    /// * `amount` - Number of cycles to shift. Positive = later, negative = earlier
    ///
    /// # Example
    /// ```
    /// use strudel_core::{pure, Value, State, TimeSpan, Fraction};
    ///
    /// // Shift pattern 0.25 cycles later
    /// let pattern = pure(Value::String("bd".into())).split_queries().shift(0.25);
    /// let state = State::new(TimeSpan::new(Fraction::from_int(0), Fraction::from_int(1)));
    /// let haps = pattern.query(state);
    ///
    /// // Event that was at 0.0 is now at 0.25
    /// assert_eq!(haps[0].part.begin, Fraction::new(1, 4));
    /// ```
    pub fn shift(self, amount: f64) -> Pattern {
        let frac_amount = Fraction::from_float(amount);

        // Shift works like late: subtract from query time, add to hap time
        // This makes positive values shift the pattern later
        self.with_query_time(move |t| t - frac_amount)
            .with_hap_time(move |t| t + frac_amount)
    }

    /// Nudge pattern earlier in time (equivalent to shift with negative value)
    ///
    /// This is the same as Strudel/TidalCycles' `early` function or `<~` operator.
    ///
    /// # Arguments
    /// * `amount` - Number of cycles to shift earlier (positive value shifts earlier)
    ///
    /// # Example
    /// ```
    /// use strudel_core::{pure, Value};
    ///
    /// // These are equivalent:
    /// let pattern1 = pure(Value::String("bd".into())).early(0.25);
    /// let pattern2 = pure(Value::String("bd".into())).shift(-0.25);
    /// ```
    pub fn early(self, amount: f64) -> Pattern {
        self.shift(-amount)
    }

    /// Nudge pattern later in time (equivalent to shift with positive value)
    ///
    /// This is the same as Strudel/TidalCycles' `late` function or `~>` operator.
    ///
    /// # Arguments
    /// * `amount` - Number of cycles to shift later (positive value shifts later)
    ///
    /// # Example
    /// ```
    /// use strudel_core::{pure, Value};
    ///
    /// // These are equivalent:
    /// let pattern1 = pure(Value::String("bd".into())).late(0.25);
    /// let pattern2 = pure(Value::String("bd".into())).shift(0.25);
    /// ```
    pub fn late(self, amount: f64) -> Pattern {
        self.shift(amount)
    }

    /// Reflect the pattern within each cycle: local time `t` in cycle `C`
    /// maps to `C + (1 - (t - C))`. Queries are split at cycle boundaries
    /// first so the reflection point is always the cycle the query falls
    /// in, never a boundary spanning two cycles.
    pub fn rev(self) -> Pattern {
        let query_func = self.query_func.clone();
        let steps = self.steps;

        Pattern {
            query_func: Arc::new(move |state| {
                let span = state.span;
                let cycle = span.begin.floor();
                let next_cycle = cycle + Fraction::from_int(1);
                let reflect = move |t: Fraction| cycle + next_cycle - t;

                let reflected_span = TimeSpan::new(reflect(span.end), reflect(span.begin));
                let reflected_state = state.set_span(reflected_span);

                query_func(reflected_state)
                    .into_iter()
                    .map(|hap| hap.with_span(|ts| TimeSpan::new(reflect(ts.end), reflect(ts.begin))))
                    .collect()
            }),
            steps,
        }
        .split_queries()
    }

    /// Set target destination for pattern events
    ///
    /// Adds a "target" metadata entry to each event's context, indicating where
    /// the event should be routed (e.g., to specific OSC targets, orbits, or MIDI devices).
    ///
    /// This corresponds to the `target` operator in Strudel/TidalCycles mini notation,
    /// which is used like: `target "mysynth" $ pattern`
    ///
    /// # Arguments
    /// * `target_name` - Name of the target destination
    ///
    /// # Example
    /// ```
    /// use strudel_core::{pure, Value};
    ///
    /// // Route pattern to a specific target
    /// let pattern = pure(Value::String("bd".into())).target("drums".to_string());
    ///
    /// // Multiple patterns can have different targets
    /// let synth_pattern = pure(Value::String("c4".into())).target("synth".to_string());
    /// let drums_pattern = pure(Value::String("bd".into())).target("drums".to_string());
    /// ```
    pub fn target(self, target_name: String) -> Pattern {
        self.with_hap(move |hap| {
            let mut new_context = hap.context.clone();
            new_context.metadata.insert("target".to_string(), Value::String(target_name.clone()));
            Hap::with_context(hap.whole, hap.part, hap.value.clone(), new_context)
        })
    }
}

/// Helper function to determine if a value is "truthy"
/// In the context of struct, we consider:
/// - Numbers: 0 is false, anything else is true
/// - Strings: empty string is false, anything else is true (including "~")
/// - Booleans: use their boolean value
/// - Lists: empty list is false, non-empty is true
/// - Silence: false
fn is_truthy(value: &crate::Value) -> bool {
    match value {
        crate::Value::Number(n) => *n != 0.0,
        crate::Value::String(s) => !s.is_empty() && s != "~",
        crate::Value::Bool(b) => *b,
        crate::Value::List(l) => !l.is_empty(),
        crate::Value::Map(m) => !m.is_empty(),
        crate::Value::Silence => false,
    }
}

// Implement Clone for Pattern
impl Clone for Pattern {
    fn clone(&self) -> Self {
        Pattern {
            query_func: self.query_func.clone(),
            steps: self.steps,
        }
    }
}
