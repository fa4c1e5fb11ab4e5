//! Class-weighted logistic regression

use faer::Mat;
use serde::{Deserialize, Serialize};

use crate::error::{AttritionError, Result};

/// Logistic regression for binary attrition labels
///
/// Fitted by full-batch gradient descent from zero weights, so identical
/// inputs always give identical coefficients. Each class is weighted by
/// `n / (2 * n_class)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticRegression {
    /// Fitted coefficients, one per design-matrix column
    pub coefficients: Option<Vec<f64>>,
    /// Fitted intercept
    pub intercept: Option<f64>,
    /// Regularization strength (L2)
    pub alpha: f64,
    /// Maximum iterations
    pub max_iter: usize,
    /// Convergence tolerance on the gradient norm
    pub tol: f64,
    /// Learning rate
    pub learning_rate: f64,
    /// Whether to reweight classes to equal total weight
    pub balanced: bool,
}

impl Default for LogisticRegression {
    fn default() -> Self {
        Self::new()
    }
}

impl LogisticRegression {
    pub fn new() -> Self {
        Self {
            coefficients: None,
            intercept: None,
            alpha: 1e-3,
            max_iter: 2000,
            tol: 1e-6,
            learning_rate: 0.5,
            balanced: true,
        }
    }

    /// Set regularization strength
    pub fn with_alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha;
        self
    }

    /// Set maximum iterations
    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    /// Set learning rate
    pub fn with_learning_rate(mut self, lr: f64) -> Self {
        self.learning_rate = lr;
        self
    }

    pub fn with_balanced(mut self, balanced: bool) -> Self {
        self.balanced = balanced;
        self
    }

    pub fn is_fitted(&self) -> bool {
        self.coefficients.is_some()
    }

    #[inline]
    fn sigmoid(z: f64) -> f64 {
        if z >= 0.0 {
            1.0 / (1.0 + (-z).exp())
        } else {
            let e = z.exp();
            e / (1.0 + e)
        }
    }

    /// Per-row sample weights for labels `y`
    fn sample_weights(&self, y: &[u8]) -> Vec<f64> {
        if !self.balanced {
            return vec![1.0; y.len()];
        }
        let n = y.len() as f64;
        let positives = y.iter().filter(|v| **v == 1).count() as f64;
        let negatives = n - positives;
        let weight = |count: f64| if count > 0.0 { n / (2.0 * count) } else { 0.0 };
        let (w1, w0) = (weight(positives), weight(negatives));
        y.iter().map(|v| if *v == 1 { w1 } else { w0 }).collect()
    }

    fn linear(x: &Mat<f64>, row: usize, weights: &[f64], bias: f64) -> f64 {
        weights
            .iter()
            .enumerate()
            .fold(bias, |acc, (j, w)| acc + x[(row, j)] * w)
    }

    /// Fit on design matrix `x` and 0/1 labels `y`.
    pub fn fit(&mut self, x: &Mat<f64>, y: &[u8]) -> Result<&mut Self> {
        let n_samples = x.nrows();
        let n_features = x.ncols();

        if n_samples == 0 {
            return Err(AttritionError::Shape {
                expected: "at least one row".to_string(),
                actual: "0 rows".to_string(),
            });
        }
        if n_samples != y.len() {
            return Err(AttritionError::Shape {
                expected: format!("y length = {}", n_samples),
                actual: format!("y length = {}", y.len()),
            });
        }

        let sample_weights = self.sample_weights(y);
        let mut weights = vec![0.0; n_features];
        let mut bias = 0.0;
        let n = n_samples as f64;
        let mut iterations = 0;

        for _ in 0..self.max_iter {
            iterations += 1;

            let mut dw = vec![0.0; n_features];
            let mut db = 0.0;
            for i in 0..n_samples {
                let p = Self::sigmoid(Self::linear(x, i, &weights, bias));
                let error = sample_weights[i] * (p - f64::from(y[i]));
                for (j, g) in dw.iter_mut().enumerate() {
                    *g += error * x[(i, j)];
                }
                db += error;
            }
            for (g, w) in dw.iter_mut().zip(&weights) {
                *g = *g / n + self.alpha * w;
            }
            db /= n;

            let grad_norm = (dw.iter().map(|v| v * v).sum::<f64>() + db * db).sqrt();
            if grad_norm < self.tol {
                break;
            }

            for (w, g) in weights.iter_mut().zip(&dw) {
                *w -= self.learning_rate * g;
            }
            bias -= self.learning_rate * db;
        }

        tracing::debug!(iterations, features = n_features, "fitted logistic regression");

        self.coefficients = Some(weights);
        self.intercept = Some(bias);
        Ok(self)
    }

    /// Probability of the positive class for each row of `x`
    pub fn predict_proba(&self, x: &Mat<f64>) -> Result<Vec<f64>> {
        let coefficients = self.coefficients.as_ref().ok_or(AttritionError::NotFitted)?;
        if x.ncols() != coefficients.len() {
            return Err(AttritionError::Shape {
                expected: format!("{} columns", coefficients.len()),
                actual: format!("{} columns", x.ncols()),
            });
        }
        let intercept = self.intercept.unwrap_or(0.0);

        Ok((0..x.nrows())
            .map(|i| Self::sigmoid(Self::linear(x, i, coefficients, intercept)))
            .collect())
    }
}
