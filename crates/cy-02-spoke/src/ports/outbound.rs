//! Driven Ports (SPI - Outbound Dependencies)

/// The algorithm's current solution, as the incumbent cache sees it.
///
/// Implementations hold the solver state, so every method takes `&self`
/// and synchronizes internally.
pub trait SolutionSource: Send + Sync {
    /// Decision coordinate of each value, in a stable order fixed at setup.
    fn coordinates(&self) -> Vec<usize>;

    /// Current value of every coordinate, in `coordinates()` order.
    fn snapshot(&self) -> Vec<f64>;

    /// Load `values` (in `coordinates()` order) back into the algorithm.
    fn restore(&self, values: &[f64]);
}
