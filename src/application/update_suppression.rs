// Update suppression - Decides whether a fresh flow-rate payload is worth committing
use crate::domain::chart::ChartPoint;

/// Equivalence test between the cached series and a newly fetched one.
pub trait SeriesEquivalence: Send + Sync {
    fn is_equivalent(&self, cached: Option<&[ChartPoint]>, incoming: &[ChartPoint]) -> bool;
}

impl<F> SeriesEquivalence for F
where
    F: Fn(Option<&[ChartPoint]>, &[ChartPoint]) -> bool + Send + Sync,
{
    fn is_equivalent(&self, cached: Option<&[ChartPoint]>, incoming: &[ChartPoint]) -> bool {
        self(cached, incoming)
    }
}

/// Same timestamps and every measurement within `tolerance`.
#[derive(Debug, Clone, Copy)]
pub struct PointwiseEquivalence {
    pub tolerance: f64,
}

impl Default for PointwiseEquivalence {
    fn default() -> Self {
        Self { tolerance: 1e-9 }
    }
}

impl PointwiseEquivalence {
    fn close(&self, a: Option<f64>, b: Option<f64>) -> bool {
        match (a, b) {
            (Some(a), Some(b)) => (a - b).abs() <= self.tolerance,
            (None, None) => true,
            _ => false,
        }
    }

    fn same_point(&self, a: &ChartPoint, b: &ChartPoint) -> bool {
        a.timestamp == b.timestamp
            && self.close(a.gfr, b.gfr)
            && self.close(a.gor, b.gor)
            && self.close(a.gvf, b.gvf)
            && self.close(a.ofr, b.ofr)
            && self.close(a.wfr, b.wfr)
            && self.close(a.wlr, b.wlr)
            && self.close(a.pressure, b.pressure)
            && self.close(a.temperature, b.temperature)
    }
}

impl SeriesEquivalence for PointwiseEquivalence {
    fn is_equivalent(&self, cached: Option<&[ChartPoint]>, incoming: &[ChartPoint]) -> bool {
        let Some(cached) = cached else {
            return false;
        };
        if cached.len() != incoming.len() {
            return false;
        }
        // Newest samples differ first when the source has moved on.
        cached
            .iter()
            .rev()
            .zip(incoming.iter().rev())
            .all(|(a, b)| self.same_point(a, b))
    }
}
