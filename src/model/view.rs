//! Trained models and their destroyable façade.
//!
//! [`Model`] is the plain trained state. [`ModelView`] owns one and adds an
//! explicit [`destroy`](ModelView::destroy): afterwards every accessor and
//! prediction fails with [`LinearError::ResourceDestroyed`] instead of
//! touching released storage.
//!
//! # Example
//!
//! ```
//! use std::collections::BTreeMap;
//! use sparselin::data::Problem;
//! use sparselin::model::ModelView;
//! use sparselin::training::{Parameter, SolverType};
//!
//! let samples = vec![
//!     BTreeMap::from([(1, 1.0)]),
//!     BTreeMap::from([(1, -1.0)]),
//! ];
//! let problem = Problem::new(&[1, -1], &samples, 1.0, 1).unwrap();
//! let mut model = ModelView::train(&problem, &Parameter::new(SolverType::L2rLr)).unwrap();
//!
//! assert_eq!(model.predict(&BTreeMap::from([(1, 2.0)])).unwrap(), 1);
//! model.destroy();
//! assert!(model.predict(&BTreeMap::from([(1, 2.0)])).is_err());
//! ```

use std::path::Path;

use ndarray::ArrayView2;
use rayon::prelude::*;

use crate::data::{FeatureNode, Problem, SparseSample};
use crate::error::{LinearError, Resource, Result};
use crate::training::{train_with, LinearSolver, Parameter, Solver, SolverType};

use super::weights::LinearWeights;

// =============================================================================
// Model
// =============================================================================

/// A trained linear classifier.
#[derive(Debug, Clone, PartialEq)]
pub struct Model {
    solver: SolverType,
    /// Class labels; weight column `k` belongs to `labels[k]`.
    labels: Vec<i32>,
    /// Number of real features (bias excluded).
    nr_feature: usize,
    /// Bias value; the model has a bias row iff `bias >= 0`.
    bias: f64,
    weights: LinearWeights,
}

impl Model {
    /// Assemble a model, checking the weight shape against the header.
    pub fn new(
        solver: SolverType,
        labels: Vec<i32>,
        nr_feature: usize,
        bias: f64,
        weights: LinearWeights,
    ) -> Result<Self> {
        if bias_index(nr_feature).is_none() {
            return Err(LinearError::InvalidParameter(format!(
                "nr_feature {nr_feature} exceeds the largest feature index"
            )));
        }
        let rows = nr_feature + usize::from(bias >= 0.0);
        let nr_w = solver.weight_rows(labels.len());
        if weights.n_rows() != rows || weights.nr_w() != nr_w {
            return Err(LinearError::InvalidParameter(format!(
                "weights are {} x {}, expected {rows} x {nr_w}",
                weights.n_rows(),
                weights.nr_w()
            )));
        }
        Ok(Self {
            solver,
            labels,
            nr_feature,
            bias,
            weights,
        })
    }

    #[inline]
    pub fn solver_type(&self) -> SolverType {
        self.solver
    }

    #[inline]
    pub fn nr_class(&self) -> usize {
        self.labels.len()
    }

    #[inline]
    pub fn nr_feature(&self) -> usize {
        self.nr_feature
    }

    #[inline]
    pub fn bias(&self) -> f64 {
        self.bias
    }

    #[inline]
    pub fn has_bias(&self) -> bool {
        self.bias >= 0.0
    }

    #[inline]
    pub fn labels(&self) -> &[i32] {
        &self.labels
    }

    #[inline]
    pub fn weights(&self) -> &LinearWeights {
        &self.weights
    }

    /// Number of weight vectors.
    #[inline]
    pub fn nr_w(&self) -> usize {
        self.weights.nr_w()
    }

    /// Whether the model has a single decision value for two classes.
    #[inline]
    fn is_binary(&self) -> bool {
        self.nr_class() == 2 && self.nr_w() == 1
    }

    /// Transient node vector for one host sample: its pairs in iteration
    /// order, then the bias node if the model has a bias, then the sentinel.
    pub fn feature_nodes<S: SparseSample + ?Sized>(&self, sample: &S) -> Vec<FeatureNode> {
        let mut nodes = Vec::with_capacity(sample.n_entries() + 2);
        nodes.extend(sample.entries().map(FeatureNode::from));
        if self.has_bias() {
            if let Some(index) = bias_index(self.nr_feature) {
                nodes.push(FeatureNode::new(index, self.bias));
            }
        }
        nodes.push(FeatureNode::SENTINEL);
        nodes
    }

    /// Raw decision values, one per weight vector.
    pub fn decision_values(&self, nodes: &[FeatureNode]) -> Vec<f64> {
        self.weights.decision_values(nodes).to_vec()
    }

    /// Predicted label plus one decision value per class label.
    pub fn predict_values(&self, nodes: &[FeatureNode]) -> Prediction {
        let dec = self.decision_values(nodes);
        if self.is_binary() {
            let d = dec[0];
            let label = if d > 0.0 { self.labels[0] } else { self.labels[1] };
            return Prediction {
                label,
                values: vec![(self.labels[0], d), (self.labels[1], -d)],
            };
        }
        let best = argmax(&dec);
        Prediction {
            label: self.labels[best],
            values: self.labels.iter().copied().zip(dec).collect(),
        }
    }

    pub fn predict(&self, nodes: &[FeatureNode]) -> i32 {
        self.predict_values(nodes).label
    }

    /// Predicted label plus one probability per class label.
    ///
    /// Only logistic solvers produce probabilities.
    pub fn predict_probabilities(&self, nodes: &[FeatureNode]) -> Result<Prediction> {
        if !self.solver.is_logistic() {
            return Err(LinearError::UnsupportedOutput(
                "probability outputs are only supported for logistic regression",
            ));
        }
        let dec = self.decision_values(nodes);
        let mut prob: Vec<f64> = dec.iter().map(|d| 1.0 / (1.0 + (-d).exp())).collect();
        if self.is_binary() {
            prob.push(1.0 - prob[0]);
        } else {
            let sum: f64 = prob.iter().sum();
            if sum > 0.0 {
                prob.iter_mut().for_each(|p| *p /= sum);
            }
        }
        let best = argmax(&prob);
        Ok(Prediction {
            label: self.labels[best],
            values: self.labels.iter().copied().zip(prob).collect(),
        })
    }
}

/// Index of the bias feature for `nr_feature` real features, if it fits in
/// an `i32`.
pub(crate) fn bias_index(nr_feature: usize) -> Option<i32> {
    i32::try_from(nr_feature).ok()?.checked_add(1)
}

fn argmax(values: &[f64]) -> usize {
    let mut best = 0;
    for (i, v) in values.iter().enumerate().skip(1) {
        if *v > values[best] {
            best = i;
        }
    }
    best
}

/// A predicted label with one score per class label, in model label order.
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    pub label: i32,
    pub values: Vec<(i32, f64)>,
}

impl Prediction {
    /// Score attached to `label`, if the model knows it.
    pub fn value(&self, label: i32) -> Option<f64> {
        self.values
            .iter()
            .find(|(l, _)| *l == label)
            .map(|&(_, v)| v)
    }
}

// =============================================================================
// ModelView
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
enum State {
    Trained(Model),
    Destroyed,
}

/// Read-only façade over a trained [`Model`] with explicit release.
///
/// Prediction never mutates the model, so a shared `&ModelView` can be used
/// from several threads at once. `destroy` takes `&mut self`, which keeps it
/// from racing with prediction.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelView {
    state: State,
}

impl From<Model> for ModelView {
    fn from(model: Model) -> Self {
        Self {
            state: State::Trained(model),
        }
    }
}

impl ModelView {
    /// Train with the built-in solvers.
    pub fn train(problem: &Problem, param: &Parameter) -> Result<Self> {
        Self::train_with(&LinearSolver, problem, param)
    }

    /// Train with a caller-supplied solver.
    pub fn train_with<S: Solver + ?Sized>(
        solver: &S,
        problem: &Problem,
        param: &Parameter,
    ) -> Result<Self> {
        train_with(solver, problem, param).map(Self::from)
    }

    /// Load a model saved with [`save`](Self::save).
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        crate::io::text::load_model(path).map(Self::from)
    }

    /// Save in the liblinear text model format. Does not modify the model.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        crate::io::text::save_model(self.model()?, path)
    }

    pub fn load_json<P: AsRef<Path>>(path: P) -> Result<Self> {
        crate::io::json::load_model(path).map(Self::from)
    }

    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        crate::io::json::save_model(self.model()?, path)
    }

    /// The trained model.
    pub fn model(&self) -> Result<&Model> {
        match &self.state {
            State::Trained(model) => Ok(model),
            State::Destroyed => Err(LinearError::ResourceDestroyed(Resource::Model)),
        }
    }

    /// Release the model. Calling this twice is a no-op.
    pub fn destroy(&mut self) {
        if let State::Trained(model) = std::mem::replace(&mut self.state, State::Destroyed) {
            tracing::debug!(
                nr_class = model.nr_class(),
                nr_feature = model.nr_feature(),
                "released model"
            );
        }
    }

    #[inline]
    pub fn is_destroyed(&self) -> bool {
        matches!(self.state, State::Destroyed)
    }

    pub fn feature_count(&self) -> Result<usize> {
        Ok(self.model()?.nr_feature())
    }

    pub fn class_count(&self) -> Result<usize> {
        Ok(self.model()?.nr_class())
    }

    pub fn bias(&self) -> Result<f64> {
        Ok(self.model()?.bias())
    }

    /// Class labels in the model's authoritative order.
    pub fn labels(&self) -> Result<&[i32]> {
        Ok(self.model()?.labels())
    }

    pub fn solver_type(&self) -> Result<SolverType> {
        Ok(self.model()?.solver_type())
    }

    /// All weights, flattened row-major as effective features × weight vectors.
    pub fn weights(&self) -> Result<Vec<f64>> {
        Ok(self.model()?.weights().to_flat())
    }

    pub fn weight_matrix(&self) -> Result<ArrayView2<'_, f64>> {
        Ok(self.model()?.weights().as_array())
    }

    /// Coefficient of 1-based `feature` in weight vector `class_idx`.
    pub fn coefficient(&self, feature: usize, class_idx: usize) -> Result<f64> {
        let model = self.model()?;
        if feature == 0 || feature > model.nr_feature() || class_idx >= model.nr_w() {
            return Err(LinearError::InvalidParameter(format!(
                "no coefficient for feature {feature} in weight vector {class_idx}"
            )));
        }
        Ok(model.weights().weight(feature - 1, class_idx))
    }

    /// Bias coefficient of weight vector `class_idx`; `0.0` without a bias.
    pub fn bias_term(&self, class_idx: usize) -> Result<f64> {
        let model = self.model()?;
        if class_idx >= model.nr_w() {
            return Err(LinearError::InvalidParameter(format!(
                "no weight vector {class_idx}"
            )));
        }
        if !model.has_bias() {
            return Ok(0.0);
        }
        Ok(model.weights().weight(model.nr_feature(), class_idx))
    }

    pub fn predict<S: SparseSample + ?Sized>(&self, sample: &S) -> Result<i32> {
        let model = self.model()?;
        Ok(model.predict(&model.feature_nodes(sample)))
    }

    pub fn predict_values<S: SparseSample + ?Sized>(&self, sample: &S) -> Result<Prediction> {
        let model = self.model()?;
        Ok(model.predict_values(&model.feature_nodes(sample)))
    }

    pub fn predict_probabilities<S: SparseSample + ?Sized>(
        &self,
        sample: &S,
    ) -> Result<Prediction> {
        let model = self.model()?;
        model.predict_probabilities(&model.feature_nodes(sample))
    }

    /// Predict every sample of a problem, using its nodes as stored.
    pub fn predict_problem(&self, problem: &Problem) -> Result<Vec<i32>> {
        let model = self.model()?;
        Ok(problem.samples()?.map(|nodes| model.predict(nodes)).collect())
    }

    /// [`predict_problem`](Self::predict_problem) spread over the rayon pool.
    pub fn par_predict_problem(&self, problem: &Problem) -> Result<Vec<i32>> {
        let model = self.model()?;
        let arena = problem.arena()?;
        Ok((0..arena.n_samples())
            .into_par_iter()
            .map(|i| model.predict(arena.sample(i).unwrap_or(&[])))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use approx::assert_abs_diff_eq;
    use ndarray::array;
    use std::collections::BTreeMap;

    fn binary() -> Model {
        // one real feature plus bias
        let weights = LinearWeights::from_array(array![[2.0], [-1.0]]);
        Model::new(SolverType::L2rLr, vec![1, -1], 1, 1.0, weights).unwrap()
    }

    #[test]
    fn oversized_feature_count_is_rejected() {
        let weights = LinearWeights::zeros(0, 1);
        let err = Model::new(SolverType::L2rLr, vec![1, -1], i32::MAX as usize, -1.0, weights)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Argument);
        assert_eq!(bias_index(3), Some(4));
    }

    #[test]
    fn binary_values_map_to_both_labels() {
        let model = binary();
        let nodes = model.feature_nodes(&BTreeMap::from([(1, 1.0)]));
        assert_eq!(nodes.last(), Some(&FeatureNode::SENTINEL));
        assert_eq!(nodes[1], FeatureNode::new(2, 1.0));

        let prediction = model.predict_values(&nodes);
        assert_eq!(prediction.label, 1);
        assert_abs_diff_eq!(prediction.value(1).unwrap(), 1.0);
        assert_abs_diff_eq!(prediction.value(-1).unwrap(), -1.0);

        let nodes = model.feature_nodes(&BTreeMap::from([(1, 0.25)]));
        assert_eq!(model.predict(&nodes), -1);
    }

    #[test]
    fn binary_probabilities_sum_to_one() {
        let model = binary();
        let nodes = model.feature_nodes(&BTreeMap::from([(1, 1.0)]));
        let prediction = model.predict_probabilities(&nodes).unwrap();
        let p1 = prediction.value(1).unwrap();
        assert_abs_diff_eq!(p1, 1.0 / (1.0 + (-1.0f64).exp()), epsilon = 1e-12);
        assert_abs_diff_eq!(p1 + prediction.value(-1).unwrap(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn probabilities_need_logistic_solver() {
        let weights = LinearWeights::from_array(array![[2.0]]);
        let model = Model::new(SolverType::L2rL1LossSvcDual, vec![1, -1], 1, -1.0, weights).unwrap();
        let err = model.predict_probabilities(&[]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Argument);
    }

    #[test]
    fn multiclass_argmax() {
        let weights = LinearWeights::from_array(array![[1.0, 0.0, -1.0], [0.0, 1.0, -1.0]]);
        let model = Model::new(SolverType::McsvmCs, vec![5, 6, 7], 2, -1.0, weights).unwrap();
        let nodes = model.feature_nodes(&vec![(2, 3.0)]);
        let prediction = model.predict_values(&nodes);
        assert_eq!(prediction.label, 6);
        assert_eq!(prediction.values, vec![(5, 0.0), (6, 3.0), (7, -3.0)]);
    }

    #[test]
    fn shape_is_checked() {
        let weights = LinearWeights::from_array(array![[1.0]]);
        assert!(Model::new(SolverType::L2rLr, vec![1, 2], 1, 1.0, weights).is_err());
    }

    #[test]
    fn destroyed_view_rejects_everything() {
        let mut view = ModelView::from(binary());
        assert_abs_diff_eq!(view.bias_term(0).unwrap(), -1.0);
        assert_abs_diff_eq!(view.coefficient(1, 0).unwrap(), 2.0);
        assert!(view.coefficient(2, 0).is_err());

        view.destroy();
        assert!(view.is_destroyed());
        assert_eq!(view.weights().unwrap_err().kind(), ErrorKind::ResourceDestroyed);
        assert_eq!(
            view.predict(&BTreeMap::from([(1, 1.0)])).unwrap_err().kind(),
            ErrorKind::ResourceDestroyed
        );
        assert!(view.labels().is_err());
        view.destroy();
        assert!(view.is_destroyed());
    }
}
