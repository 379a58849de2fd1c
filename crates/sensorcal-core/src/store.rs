use crate::CalibrationError;

/// Ordered measurements with optional per-measurement quality scores.
///
/// The store is only mutated between runs; during `calibrate` it is borrowed
/// immutably for the whole run.
#[derive(Debug, Clone)]
pub struct MeasurementStore<M> {
    data: Vec<M>,
    quality_scores: Option<Vec<f64>>,
}

impl<M> Default for MeasurementStore<M> {
    fn default() -> Self {
        Self {
            data: Vec::new(),
            quality_scores: None,
        }
    }
}

impl<M> MeasurementStore<M> {
    pub fn new(data: Vec<M>) -> Self {
        Self {
            data,
            quality_scores: None,
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn measurements(&self) -> &[M] {
        &self.data
    }

    pub fn quality_scores(&self) -> Option<&[f64]> {
        self.quality_scores.as_deref()
    }

    /// Replace the measurements. Quality scores are kept; readiness reports
    /// a length mismatch if they no longer line up.
    pub fn set_measurements(&mut self, data: Vec<M>) {
        self.data = data;
    }

    /// Replace the quality scores.
    ///
    /// Scores must be finite and non-negative. When measurements are present,
    /// the length must match.
    pub fn set_quality_scores(&mut self, scores: Option<Vec<f64>>) -> Result<(), CalibrationError> {
        if let Some(scores) = scores.as_deref() {
            validate_quality_scores(scores)?;
            if !self.data.is_empty() && scores.len() != self.data.len() {
                return Err(CalibrationError::QualityScoresLength {
                    expected: self.data.len(),
                    got: scores.len(),
                });
            }
        }
        self.quality_scores = scores;
        Ok(())
    }

    /// Replace measurements and scores together.
    pub fn set_with_quality(&mut self, data: Vec<M>, scores: Vec<f64>) -> Result<(), CalibrationError> {
        validate_quality_scores(&scores)?;
        if scores.len() != data.len() {
            return Err(CalibrationError::QualityScoresLength {
                expected: data.len(),
                got: scores.len(),
            });
        }
        self.data = data;
        self.quality_scores = Some(scores);
        Ok(())
    }
}

fn validate_quality_scores(scores: &[f64]) -> Result<(), CalibrationError> {
    if let Some((idx, &q)) = scores
        .iter()
        .enumerate()
        .find(|(_, q)| !(q.is_finite() && **q >= 0.0))
    {
        return Err(CalibrationError::invalid(
            "quality_scores",
            format!("score {q} at index {idx} is not a finite non-negative number"),
        ));
    }
    Ok(())
}
