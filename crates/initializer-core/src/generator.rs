//! Asynchronous project generation with a single in-flight guard

use crate::archive::{self, Delivery};
use crate::error::{ScaffoldError, ScaffoldResult};
use crate::project::ProjectDescriptor;
use crate::render;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};

/// Summary of a finished generation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationReport {
    /// Where the delivery put the result
    pub location: PathBuf,
    pub archive_name: String,
    pub file_count: usize,
    pub archive_size: usize,
}

/// Renders, packages and delivers projects, one at a time
pub struct Generator<D: Delivery> {
    delivery: D,
    in_flight: AtomicBool,
}

/// Clears the in-flight flag when dropped, on success or failure
struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl<D: Delivery> Generator<D> {
    pub fn new(delivery: D) -> Self {
        Self {
            delivery,
            in_flight: AtomicBool::new(false),
        }
    }

    pub fn delivery(&self) -> &D {
        &self.delivery
    }

    /// Whether a generation currently holds the guard
    pub fn is_generating(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    fn acquire(&self) -> ScaffoldResult<InFlight<'_>> {
        self.in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| InFlight(&self.in_flight))
            .map_err(|_| ScaffoldError::GenerationInProgress)
    }

    /// Generate the archive for `project` and deliver it.
    ///
    /// Rejected with `GenerationInProgress` while another call is running.
    /// Any failure aborts the whole run before delivery.
    pub async fn generate(&self, project: &ProjectDescriptor) -> ScaffoldResult<GenerationReport> {
        let _guard = self.acquire()?;

        let rendered = render::render(project);
        let file_count = rendered.files.len();
        let archive_name = format!("{}.zip", rendered.root);

        let bytes = tokio::task::spawn_blocking(move || archive::package(&rendered)).await??;
        let archive_size = bytes.len();

        let location = self.delivery.deliver(&archive_name, bytes).await?;

        tracing::info!(
            project = %project.name,
            location = %location.display(),
            files = file_count,
            bytes = archive_size,
            "project generated"
        );

        Ok(GenerationReport {
            location,
            archive_name,
            file_count,
            archive_size,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::{read_entries, ArchiveEntry, MemoryDelivery};
    use crate::catalog::Catalog;
    use crate::project::ProjectSettings;
    use crate::selection::Selection;
    use std::future::Future;
    use std::sync::Arc;
    use tokio::sync::Notify;

    fn project() -> ProjectDescriptor {
        let catalog = Catalog::bundled().unwrap();
        let selection = Selection::new(&catalog);
        ProjectDescriptor::snapshot(&catalog, &selection, ProjectSettings::defaults(&catalog))
            .unwrap()
    }

    /// Delivery that blocks until released
    struct GatedDelivery {
        entered: Arc<Notify>,
        release: Arc<Notify>,
    }

    impl Delivery for GatedDelivery {
        fn deliver(
            &self,
            file_name: &str,
            _bytes: Vec<u8>,
        ) -> impl Future<Output = ScaffoldResult<PathBuf>> + Send {
            let entered = self.entered.clone();
            let release = self.release.clone();
            let path = PathBuf::from(file_name);
            async move {
                entered.notify_one();
                release.notified().await;
                Ok(path)
            }
        }
    }

    #[tokio::test]
    async fn test_generate_delivers_one_archive() {
        let generator = Generator::new(MemoryDelivery::new());

        let report = generator.generate(&project()).await.unwrap();

        assert_eq!(report.archive_name, "my-robot-project.zip");
        assert_eq!(report.file_count, 5);
        let delivered = generator.delivery().delivered();
        assert_eq!(delivered.len(), 1);
        assert_eq!(delivered[0].1.len(), report.archive_size);
        assert!(!generator.is_generating());
    }

    #[tokio::test]
    async fn test_generation_is_deterministic() {
        let generator = Generator::new(MemoryDelivery::new());
        let project = project();

        generator.generate(&project).await.unwrap();
        generator.generate(&project).await.unwrap();

        let delivered = generator.delivery().delivered();
        let first = read_entries(&delivered[0].1).unwrap();
        let second = read_entries(&delivered[1].1).unwrap();
        assert_eq!(first, second);
        assert!(first.contains(&ArchiveEntry::Dir(PathBuf::from("my-robot-project/results"))));
    }

    #[tokio::test]
    async fn test_concurrent_generation_rejected() {
        let entered = Arc::new(Notify::new());
        let release = Arc::new(Notify::new());
        let generator = Arc::new(Generator::new(GatedDelivery {
            entered: entered.clone(),
            release: release.clone(),
        }));

        let first = {
            let generator = generator.clone();
            tokio::spawn(async move { generator.generate(&project()).await })
        };
        entered.notified().await;

        assert!(generator.is_generating());
        let err = generator.generate(&project()).await.unwrap_err();
        assert!(matches!(err, ScaffoldError::GenerationInProgress));

        release.notify_one();
        first.await.unwrap().unwrap();
        assert!(!generator.is_generating());
    }

    #[tokio::test]
    async fn test_failed_generation_releases_guard() {
        let generator = Generator::new(MemoryDelivery::new());
        let mut project = project();
        project.name = "bad/name".to_string();

        let err = generator.generate(&project).await.unwrap_err();
        assert!(matches!(err, ScaffoldError::Folder { .. }));
        assert!(generator.delivery().delivered().is_empty());
        assert!(!generator.is_generating());
    }
}
