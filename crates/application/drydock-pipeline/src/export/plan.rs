use camino::{Utf8Path, Utf8PathBuf};
use drydock_core::{mirror, FolderSnapshot, HubSnapshot};

use crate::export::ExportOptions;
use crate::io_utils;

/// What an export run would do with one leaf.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Would open and export.
    Pending,
    /// Skip rule applies: a non-empty file is already at the target.
    UpToDate,
    /// Type tag does not match the export format.
    OtherFormat,
}

#[derive(Debug, Clone)]
pub struct PlannedFile {
    pub target: Utf8PathBuf,
    pub disposition: Disposition,
}

#[derive(Debug, Clone, Default)]
pub struct PlanSummary {
    pub files: Vec<PlannedFile>,
}

impl PlanSummary {
    pub fn pending(&self) -> usize {
        self.count(Disposition::Pending)
    }

    pub fn up_to_date(&self) -> usize {
        self.count(Disposition::UpToDate)
    }

    pub fn other_format(&self) -> usize {
        self.count(Disposition::OtherFormat)
    }

    pub fn is_up_to_date(&self) -> bool {
        self.pending() == 0
    }

    fn count(&self, d: Disposition) -> usize {
        self.files.iter().filter(|f| f.disposition == d).count()
    }
}

/// Classify every leaf of a snapshot against the local mirror. Pure read:
/// never creates directories and never talks to the service.
pub fn evaluate(hubs: &[HubSnapshot], export_root: &Utf8Path, options: &ExportOptions) -> PlanSummary {
    let mut summary = PlanSummary::default();
    for hub in hubs {
        for project in &hub.projects {
            let base = mirror::project_dir(export_root, &hub.name, &project.name);
            evaluate_folder(&project.root, &base, options, &mut summary);
        }
    }
    summary
}

fn evaluate_folder(
    folder: &FolderSnapshot,
    dir: &Utf8Path,
    options: &ExportOptions,
    out: &mut PlanSummary,
) {
    for file in &folder.files {
        let format = options.format_tag();
        let matches = file.extension.eq_ignore_ascii_case(format);
        let ext = if matches { format } else { &file.extension };
        let target = mirror::export_file_path(dir, &file.name, ext);

        let disposition = if !matches {
            Disposition::OtherFormat
        } else if options.skip_existing && io_utils::has_nonzero_size(&target) {
            Disposition::UpToDate
        } else {
            Disposition::Pending
        };

        out.files.push(PlannedFile {
            target,
            disposition,
        });
    }

    for sub in &folder.folders {
        let sub_dir = mirror::mirrored_child(dir, &sub.name);
        evaluate_folder(sub, &sub_dir, options, out);
    }
}
