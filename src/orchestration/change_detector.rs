use crate::models::DeploymentDescriptor;
use tracing::debug;

/// Gates manifest submission on a structural change of the desired state
#[derive(Debug, Clone, Default)]
pub struct ChangeDetector {
    committed: Option<DeploymentDescriptor>,
}

impl ChangeDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resume from a previously committed snapshot
    pub fn with_snapshot(committed: Option<DeploymentDescriptor>) -> Self {
        Self { committed }
    }

    /// `true` when nothing was committed yet or `candidate` differs from the last commit
    pub fn has_changed(&self, candidate: &DeploymentDescriptor) -> bool {
        descriptors_differ(self.committed.as_ref(), candidate)
    }

    pub fn commit(&mut self, descriptor: DeploymentDescriptor) {
        debug!(version = %descriptor.version_marker, "Committing desired state snapshot");
        self.committed = Some(descriptor);
    }

    /// Forget the committed snapshot so the next build is always applied
    pub fn reset(&mut self) {
        self.committed = None;
    }

    pub fn snapshot(&self) -> Option<&DeploymentDescriptor> {
        self.committed.as_ref()
    }
}

/// Structural comparison; property maps are ordered so iteration order never matters
pub fn descriptors_differ(previous: Option<&DeploymentDescriptor>, candidate: &DeploymentDescriptor) -> bool {
    previous != Some(candidate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::WorkerConfiguration;

    fn descriptor(replicas: u32, pairs: &[(&str, &str)]) -> DeploymentDescriptor {
        let properties: WorkerConfiguration = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        DeploymentDescriptor::new("connect", properties, replicas, "example/connect:1")
    }

    #[test]
    fn test_first_snapshot_is_a_change() {
        let detector = ChangeDetector::new();
        assert!(detector.has_changed(&descriptor(1, &[])));
    }

    #[test]
    fn test_commit_then_identical_is_unchanged() {
        let mut detector = ChangeDetector::new();
        let snapshot = descriptor(1, &[("a", "1"), ("b", "2")]);
        detector.commit(snapshot.clone());

        assert!(!detector.has_changed(&snapshot));
        assert!(!detector.has_changed(&descriptor(1, &[("b", "2"), ("a", "1")])));
    }

    #[test]
    fn test_any_field_change_is_detected() {
        let mut detector = ChangeDetector::new();
        detector.commit(descriptor(1, &[("a", "1")]));

        assert!(detector.has_changed(&descriptor(2, &[("a", "1")])));
        assert!(detector.has_changed(&descriptor(1, &[("a", "2")])));
        assert!(detector.has_changed(&descriptor(1, &[("a", "1"), ("rest.port", "9000")])));
    }

    #[test]
    fn test_reset_forces_change() {
        let mut detector = ChangeDetector::new();
        let snapshot = descriptor(1, &[]);
        detector.commit(snapshot.clone());
        detector.reset();

        assert!(detector.snapshot().is_none());
        assert!(detector.has_changed(&snapshot));
    }
}
