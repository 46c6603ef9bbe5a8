// Decay segments
// Finite numeric sequences that schedules are assembled from

/// Linear interpolation from `from` to `to` over a fixed number of steps
///
/// The increment is `(to - from) / (steps - 1)`, so the first value is
/// exactly `from` and the last lands on `to`. A single step yields `from`
/// and zero steps yield nothing.
#[derive(Debug, Clone)]
pub struct LinearDecay {
    from: f64,
    increment: f64,
    step: usize,
    steps: usize,
}

impl LinearDecay {
    pub fn new(from: f64, to: f64, steps: usize) -> Self {
        let increment = if steps > 1 {
            (to - from) / (steps - 1) as f64
        } else {
            0.0
        };

        Self {
            from,
            increment,
            step: 0,
            steps,
        }
    }
}

impl Iterator for LinearDecay {
    type Item = f64;

    fn next(&mut self) -> Option<f64> {
        if self.step >= self.steps {
            return None;
        }
        let value = self.from + self.increment * self.step as f64;
        self.step += 1;
        Some(value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.steps - self.step;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for LinearDecay {}

/// Geometric decay: each value is the previous one divided by `anneal`
///
/// The current value is yielded before dividing, so the first value is
/// exactly `from`.
#[derive(Debug, Clone)]
pub struct DivDecay {
    value: f64,
    anneal: f64,
    remaining: usize,
}

impl DivDecay {
    pub fn new(from: f64, anneal: f64, steps: usize) -> Self {
        Self {
            value: from,
            anneal,
            remaining: steps,
        }
    }
}

impl Iterator for DivDecay {
    type Item = f64;

    fn next(&mut self) -> Option<f64> {
        if self.remaining == 0 {
            return None;
        }
        let value = self.value;
        self.value /= self.anneal;
        self.remaining -= 1;
        Some(value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for DivDecay {}

/// Linear segment of `steps` values from `from` to `to`
pub fn linear_decay(from: f64, to: f64, steps: usize) -> LinearDecay {
    LinearDecay::new(from, to, steps)
}

/// Geometric segment of `steps` values starting at `from`
pub fn div_decay(from: f64, anneal: f64, steps: usize) -> DivDecay {
    DivDecay::new(from, anneal, steps)
}

/// Constant segment: `value` repeated `steps` times
pub fn constant(value: f64, steps: usize) -> std::iter::Take<std::iter::Repeat<f64>> {
    std::iter::repeat(value).take(steps)
}
