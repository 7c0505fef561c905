//! Result export in text or JSON form
//!
//! Text output starts with `#` comment lines describing the run, followed
//! by whitespace separated records. Labels in text records are
//! percent-escaped (see [`escape_label`]) so every record splits back into
//! its fields. JSON output carries the same content with raw labels.

use std::borrow::Cow;
use std::fmt::Write as _;
use std::path::Path;

use serde::Serialize;

use crate::array::FeatureArray;
use crate::error::{MalheurError, Result};
use crate::kernel::KernelMatrix;
use crate::prototype::PrototypeSet;
use crate::storage::write_atomic;
use crate::types::{ExportFormat, KernelScheme, MetricDirection};

#[derive(Serialize)]
struct PrototypeDocument<'a> {
    task: &'static str,
    reports: usize,
    prototypes: usize,
    kernel: KernelScheme,
    metric: MetricDirection,
    threshold: f64,
    representatives: Vec<RepresentativeEntry<'a>>,
    assignments: Vec<AssignmentEntry<'a>>,
}

#[derive(Serialize)]
struct RepresentativeEntry<'a> {
    id: usize,
    report: &'a str,
    members: usize,
    radius: f64,
}

#[derive(Serialize)]
struct AssignmentEntry<'a> {
    report: &'a str,
    prototype: &'a str,
    distance: f64,
}

#[derive(Serialize)]
struct KernelDocument<'a> {
    task: &'static str,
    kernel: KernelScheme,
    rows: Vec<&'a str>,
    cols: Vec<&'a str>,
    values: Vec<&'a [f64]>,
}

/// Render the prototype result for `array`
///
/// `set` must have been extracted from `array`.
pub fn render_prototypes(
    set: &PrototypeSet,
    array: &FeatureArray,
    format: ExportFormat,
) -> Result<String> {
    if set.report_count() != array.len() {
        return Err(MalheurError::input(
            "prototype export",
            format!(
                "{} assignments for {} reports",
                set.report_count(),
                array.len()
            ),
        ));
    }

    let rows = array.iter().enumerate().map(|(i, report)| {
        let assignment = &set.assignments()[i];
        let source = set
            .get(assignment.prototype)
            .map_or("", |p| p.label.as_str());
        (report.label.as_str(), source, assignment.distance)
    });

    match format {
        ExportFormat::Text => {
            let mut out = String::new();
            let _ = writeln!(out, "# malheur prototype");
            let _ = writeln!(out, "# reports: {}", array.len());
            let _ = writeln!(out, "# prototypes: {}", set.len());
            let _ = writeln!(out, "# kernel: {}", set.scheme());
            let _ = writeln!(out, "# metric: {}", set.metric());
            let _ = writeln!(out, "# threshold: {}", set.threshold());
            for (report, source, distance) in rows {
                let _ = writeln!(
                    out,
                    "{} {} {:.6}",
                    escape_label(report),
                    escape_label(source),
                    distance
                );
            }
            Ok(out)
        }
        ExportFormat::Json => {
            let document = PrototypeDocument {
                task: "prototype",
                reports: array.len(),
                prototypes: set.len(),
                kernel: set.scheme(),
                metric: set.metric(),
                threshold: set.threshold(),
                representatives: set
                    .iter()
                    .map(|p| RepresentativeEntry {
                        id: p.id,
                        report: &p.label,
                        members: p.members.len(),
                        radius: p.radius,
                    })
                    .collect(),
                assignments: rows
                    .map(|(report, prototype, distance)| AssignmentEntry {
                        report,
                        prototype,
                        distance,
                    })
                    .collect(),
            };
            Ok(serde_json::to_string_pretty(&document)?)
        }
    }
}

/// Render a kernel matrix with its row and column labels
pub fn render_kernel(
    matrix: &KernelMatrix,
    rows: &FeatureArray,
    cols: &FeatureArray,
    scheme: KernelScheme,
    format: ExportFormat,
) -> Result<String> {
    if matrix.shape() != (rows.len(), cols.len()) {
        return Err(MalheurError::input(
            "kernel export",
            format!(
                "matrix is {}x{} but labels are {}x{}",
                matrix.rows(),
                matrix.cols(),
                rows.len(),
                cols.len()
            ),
        ));
    }

    match format {
        ExportFormat::Text => {
            let mut out = String::new();
            let _ = writeln!(out, "# malheur kernel");
            let _ = writeln!(out, "# shape: {}x{}", matrix.rows(), matrix.cols());
            let _ = writeln!(out, "# kernel: {}", scheme);
            let labels: Vec<Cow<'_, str>> =
                cols.iter().map(|r| escape_label(&r.label)).collect();
            let _ = writeln!(out, "# {}", labels.join(" "));
            for (report, values) in rows.iter().zip(matrix.iter_rows()) {
                out.push_str(&escape_label(&report.label));
                for value in values {
                    let _ = write!(out, " {:.6}", value);
                }
                out.push('\n');
            }
            Ok(out)
        }
        ExportFormat::Json => {
            let document = KernelDocument {
                task: "kernel",
                kernel: scheme,
                rows: rows.iter().map(|r| r.label.as_str()).collect(),
                cols: cols.iter().map(|r| r.label.as_str()).collect(),
                values: matrix.iter_rows().collect(),
            };
            Ok(serde_json::to_string_pretty(&document)?)
        }
    }
}

/// Escape a label for a whitespace separated text record
///
/// `%`, whitespace and control characters become `%XX` per UTF-8 byte.
/// Labels without such characters are returned unchanged.
pub fn escape_label(label: &str) -> Cow<'_, str> {
    let needs_escape = |c: char| c == '%' || c.is_whitespace() || c.is_control();
    if !label.contains(needs_escape) {
        return Cow::Borrowed(label);
    }

    let mut out = String::with_capacity(label.len() + 8);
    let mut buf = [0u8; 4];
    for c in label.chars() {
        if needs_escape(c) {
            for byte in c.encode_utf8(&mut buf).bytes() {
                let _ = write!(out, "%{:02X}", byte);
            }
        } else {
            out.push(c);
        }
    }
    Cow::Owned(out)
}

/// Write the prototype result to `path`
pub fn export_prototypes(
    path: impl AsRef<Path>,
    set: &PrototypeSet,
    array: &FeatureArray,
    format: ExportFormat,
) -> Result<()> {
    let path = path.as_ref();
    let content = render_prototypes(set, array, format)?;
    write_atomic(path, content.as_bytes())?;
    tracing::info!("Wrote prototype assignments to {}", path.display());
    Ok(())
}

/// Write a kernel matrix to `path`
pub fn export_kernel(
    path: impl AsRef<Path>,
    matrix: &KernelMatrix,
    rows: &FeatureArray,
    cols: &FeatureArray,
    scheme: KernelScheme,
    format: ExportFormat,
) -> Result<()> {
    let path = path.as_ref();
    let content = render_kernel(matrix, rows, cols, scheme, format)?;
    write_atomic(path, content.as_bytes())?;
    tracing::info!(
        "Wrote {}x{} kernel matrix to {}",
        matrix.rows(),
        matrix.cols(),
        path.display()
    );
    Ok(())
}
