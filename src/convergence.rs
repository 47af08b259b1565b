use crate::memory::*;

/// Enum with possible convergence criteria.
/// These criteria decide when a running refinement (Lloyd iterations) is considered converged.
/// Each criterion compares the cost after an iteration with the cost before it; the reference for the
/// first iteration is the cost of the initial centroids.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ConvergenceCriterion<T: Primitive> {
	/// Converged as soon as the magnitude of the cost change drops below **tolerance**:
	/// `|previous - cost| < tolerance`.
	CostDelta { tolerance: T },
	/// Converged as soon as the cost change, relative to the new cost, is at most **tolerance**:
	/// `|previous - cost| / cost <= tolerance`. A cost of zero always counts as converged.
	RelativeCostDelta { tolerance: T },
    /// Converged when there have not been any improvements after **x** iterations,
    /// where `improvement > threshold`.
	/// ## Fields:
	/// - **x**: The amount of consecutive iterations without improvement, after which the calculation converged
	/// - **threshold**: Threshold, used to detect an improvement (`improvement > threshold`)
	/// - **abort_on_negative**: Specifies whether the criterion instantly reports convergence when the cost
	/// increased (**true**), or if increases are handled as "no improvements" (**false**).
	NoImprovementForXIterations { x: usize, threshold: T, abort_on_negative: bool }
}
impl<T: Primitive> Default for ConvergenceCriterion<T> {
	fn default() -> Self {
		ConvergenceCriterion::CostDelta { tolerance: T::from(1e-5).unwrap_or_else(T::epsilon) }
	}
}
impl<T: Primitive> ConvergenceCriterion<T> {
	pub(crate) fn create_logic(&self, initial_cost: T) -> Box<dyn ConvergenceLogic<T>> {
		match *self {
			ConvergenceCriterion::CostDelta { tolerance } => Box::new(CostDeltaLogic {
				tolerance,
				prev_cost: initial_cost
			}),
			ConvergenceCriterion::RelativeCostDelta { tolerance } => Box::new(RelativeCostDeltaLogic {
				tolerance,
				prev_cost: initial_cost
			}),
			ConvergenceCriterion::NoImprovementForXIterations { x, threshold, abort_on_negative } => Box::new(NoImprovementForXIterationsLogic {
				x, threshold, abort_on_negative,
				prev_cost: initial_cost,
				no_improvement_counter: 0
			})
		}
	}
}

pub(crate) trait ConvergenceLogic<T: Primitive> {
	/// Function that has to be called once an iteration of the calculation ended, and a new cost was calculated.
	/// ## Arguments
	/// - **cost**: The new cost (distsum), after an iteration
	/// ## Returns
	/// - **true** if the calculation converged and should stop
	/// - **false** if the calculation should continue
	fn converged(&mut self, cost: T) -> bool;
}


pub(crate) struct CostDeltaLogic<T: Primitive> {
	tolerance: T,
	prev_cost: T
}
impl<T: Primitive> ConvergenceLogic<T> for CostDeltaLogic<T> {
	fn converged(&mut self, cost: T) -> bool {
		let delta = (self.prev_cost - cost).abs();
		self.prev_cost = cost;
		delta < self.tolerance
	}
}


pub(crate) struct RelativeCostDeltaLogic<T: Primitive> {
	tolerance: T,
	prev_cost: T
}
impl<T: Primitive> ConvergenceLogic<T> for RelativeCostDeltaLogic<T> {
	fn converged(&mut self, cost: T) -> bool {
		let delta = (self.prev_cost - cost).abs();
		self.prev_cost = cost;
		cost == T::zero() || delta / cost <= self.tolerance
	}
}


pub(crate) struct NoImprovementForXIterationsLogic<T: Primitive> {
	x: usize,
	threshold: T,
	abort_on_negative: bool,
	prev_cost: T,
	no_improvement_counter: usize
}
impl<T: Primitive> ConvergenceLogic<T> for NoImprovementForXIterationsLogic<T> {
	fn converged(&mut self, cost: T) -> bool {
		let improvement = self.prev_cost - cost;
		self.prev_cost = cost;
		if self.abort_on_negative && improvement < T::zero() { // Cost increased, and instant stop is requested
			return true;
		}
		if improvement > self.threshold { // positive improvement: reset no-improv-counter
			self.no_improvement_counter = 0;
		} else { // Still no improvement, count 1 up
			self.no_improvement_counter += 1;
		}
		self.no_improvement_counter >= self.x
	}
}
