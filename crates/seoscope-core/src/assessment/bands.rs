//! Named score bands.
//!
//! A [`ScoreBands`] maps a measured value to a score. It has a floor score
//! for values below the first boundary and one named step per boundary.
//! Bands include their lower edge. A value sitting exactly on a boundary
//! goes to whichever neighbouring band scores better, the upper one on a
//! tie, so a boundary between a good band and a worse band above it acts
//! as the good band's inclusive maximum.

/// One named boundary and the score from there up to the next boundary.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Step {
    /// Boundary name, as used in threshold overrides.
    pub name: &'static str,
    /// Boundary value.
    pub from: f64,
    /// Score of the band starting at this boundary.
    pub score: u8,
}

/// Ordered boundaries of one measure.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreBands {
    floor: u8,
    steps: Vec<Step>,
}

impl ScoreBands {
    /// Build bands from a floor score and `(name, boundary, score)` steps in
    /// ascending boundary order.
    pub fn new(floor: u8, steps: &[(&'static str, f64, u8)]) -> Self {
        Self {
            floor,
            steps: steps
                .iter()
                .map(|&(name, from, score)| Step { name, from, score })
                .collect(),
        }
    }

    /// Score for a measured value.
    pub fn score(&self, value: f64) -> u8 {
        self.score_of(self.band(value))
    }

    /// Index of the band a value falls into, 0 being the floor.
    pub fn band(&self, value: f64) -> usize {
        let upper = self.steps.partition_point(|step| step.from <= value);
        if upper > 0
            && self.steps[upper - 1].from == value
            && self.score_of(upper - 1) > self.score_of(upper)
        {
            upper - 1
        } else {
            upper
        }
    }

    fn score_of(&self, band: usize) -> u8 {
        match band {
            0 => self.floor,
            n => self.steps[n - 1].score,
        }
    }

    /// Value of a named boundary.
    pub fn get(&self, name: &str) -> Option<f64> {
        self.steps.iter().find(|s| s.name == name).map(|s| s.from)
    }

    /// Boundary names and values in ascending order.
    pub fn thresholds(&self) -> Vec<(&'static str, f64)> {
        self.steps.iter().map(|s| (s.name, s.from)).collect()
    }

    /// Replace a boundary value.
    ///
    /// On error the bands are unchanged and the reason is returned.
    pub fn set(&mut self, name: &str, value: f64) -> Result<(), String> {
        self.set_all([(name, value)]).map_err(|e| e.reason)
    }

    /// Replace several boundary values at once.
    ///
    /// Every value must be finite and name a known boundary, and the
    /// boundaries must be strictly ascending once all values are in place.
    /// On error the bands are unchanged.
    pub fn set_all<'n>(
        &mut self,
        values: impl IntoIterator<Item = (&'n str, f64)>,
    ) -> Result<(), InvalidBoundary> {
        let mut steps = self.steps.clone();
        let mut changed = Vec::new();
        for (name, value) in values {
            let invalid = |reason: String| InvalidBoundary {
                name: name.to_string(),
                reason,
            };
            if !value.is_finite() {
                return Err(invalid(format!("{value} is not a finite number")));
            }
            let step = steps.iter_mut().find(|s| s.name == name).ok_or_else(|| {
                let known: Vec<&str> = self.steps.iter().map(|s| s.name).collect();
                invalid(format!(
                    "unknown boundary (expected one of: {})",
                    known.join(", ")
                ))
            })?;
            step.from = value;
            changed.push(step.name);
        }

        if let Some(pair) = steps.windows(2).find(|w| w[0].from >= w[1].from) {
            let (lower, upper) = (&pair[0], &pair[1]);
            return Err(if changed.contains(&upper.name) {
                InvalidBoundary {
                    name: upper.name.to_string(),
                    reason: format!("must be greater than {} ({})", lower.name, lower.from),
                }
            } else {
                InvalidBoundary {
                    name: lower.name.to_string(),
                    reason: format!("must be less than {} ({})", upper.name, upper.from),
                }
            });
        }
        self.steps = steps;
        Ok(())
    }
}

/// A rejected boundary override.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidBoundary {
    /// The boundary the override named.
    pub name: String,
    /// Why it was rejected.
    pub reason: String,
}
