// ============================================================
// Layer 2 — ExportUseCase
// ============================================================
// Packages a trained snapshot for deployment: copies the
// weights + metadata pair into an output directory and writes a
// README.txt describing what the files are, how to serve them,
// and where they came from. The pair is self-describing, so the
// output directory is everything another machine needs.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

use crate::infra::snapshot::SnapshotStore;

pub struct ExportUseCase {
    snapshot_dir: String,
    stem:         String,
    output_dir:   String,
}

impl ExportUseCase {
    pub fn new(snapshot_dir: String, stem: String, output_dir: String) -> Self {
        Self { snapshot_dir, stem, output_dir }
    }

    pub fn execute(&self) -> Result<()> {
        let store = SnapshotStore::new(&self.snapshot_dir)?;

        // Reading the sidecar first doubles as an existence check
        // and supplies the provenance block for the README.
        let meta = store.load_meta(&self.stem)?;

        let out = Path::new(&self.output_dir);
        fs::create_dir_all(out)
            .with_context(|| format!("Cannot create output directory '{}'", out.display()))?;

        let weights_name = format!("{}.mpk", self.stem);
        let meta_name    = format!("{}.json", self.stem);

        let weights_src = store.weights_path(&self.stem);
        fs::copy(&weights_src, out.join(&weights_name))
            .with_context(|| format!("Cannot copy weights '{}'", weights_src.display()))?;

        let meta_src = store.meta_path(&self.stem);
        fs::copy(&meta_src, out.join(&meta_name))
            .with_context(|| format!("Cannot copy metadata '{}'", meta_src.display()))?;

        let readme = format!(
            "Racing policy deployment package\n\
             ================================\n\
             \n\
             Files:\n\
             - {weights_name}  trained network weights\n\
             - {meta_name}  feature configuration, architecture, training history\n\
             \n\
             Provenance:\n\
             - trained:      {created}\n\
             - feature mode: {mode} ({width} inputs)\n\
             \n\
             To serve this policy, place both files in a snapshot\n\
             directory and run:\n\
             \n\
             racing-pilot serve --snapshot-dir <dir> --snapshot {stem}\n",
            weights_name = weights_name,
            meta_name = meta_name,
            created = meta.created_at,
            mode = meta.features.mode.name(),
            width = meta.network.input_size,
            stem = self.stem,
        );
        let readme_path = out.join("README.txt");
        fs::write(&readme_path, readme)
            .with_context(|| format!("Cannot write '{}'", readme_path.display()))?;

        println!(
            "Exported '{}' snapshot to '{}' ({}, {}, README.txt)",
            self.stem,
            out.display(),
            weights_name,
            meta_name
        );
        Ok(())
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::features::{FeatureConfig, FeatureMode};
    use crate::infra::metrics::TrainingHistory;
    use crate::infra::snapshot::{NetworkMeta, SnapshotMeta};

    fn seeded_store(dir: &Path) -> SnapshotStore {
        let store = SnapshotStore::new(dir.to_str().unwrap()).unwrap();
        let meta = SnapshotMeta::new(
            FeatureConfig {
                canvas_width:  1024.0,
                canvas_height: 768.0,
                max_speed:     300.0,
                mode:          FeatureMode::Rays { count: 3 },
            },
            NetworkMeta { input_size: 9, hidden_sizes: vec![16], dropout: 0.2 },
            TrainingHistory::default(),
        );
        store.save_meta("best", &meta).unwrap();
        fs::write(dir.join("best.mpk"), b"weights").unwrap();
        store
    }

    #[test]
    fn exports_pair_and_readme() {
        let snapshots = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();
        seeded_store(snapshots.path());

        ExportUseCase::new(
            snapshots.path().to_str().unwrap().to_string(),
            "best".to_string(),
            output.path().to_str().unwrap().to_string(),
        )
        .execute()
        .unwrap();

        assert!(output.path().join("best.mpk").exists());
        assert!(output.path().join("best.json").exists());
        let readme = fs::read_to_string(output.path().join("README.txt")).unwrap();
        assert!(readme.contains("rays"));
        assert!(readme.contains("9 inputs"));
    }

    #[test]
    fn missing_snapshot_fails_before_writing_anything() {
        let snapshots = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();
        let outdir = output.path().join("deployment");

        let result = ExportUseCase::new(
            snapshots.path().to_str().unwrap().to_string(),
            "best".to_string(),
            outdir.to_str().unwrap().to_string(),
        )
        .execute();

        assert!(result.is_err());
        assert!(!outdir.exists());
    }
}
