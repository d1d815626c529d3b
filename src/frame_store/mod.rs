//! Loading of PoseTrack `annolist` JSON files into sequences.
//!
//! Ground truth and predictions live in two directories with one JSON file
//! per sequence; files are paired by name. While loading:
//!
//! - persons without any keypoint are dropped,
//! - keypoints inside the ground-truth ignore regions of a frame are removed
//!   from both sources (and persons left empty are dropped),
//! - ground-truth head boxes are turned into head sizes.

mod schema;

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use nalgebra::Point2;
use tracing::{debug, info};

use crate::annotation::{Frame, Keypoint, Person, Sequence, SequencePair};
use crate::config::EvalConfig;
use crate::joints::Joint;
use crate::utils::{head_size, Polygon};
use crate::{Error, Result};

use schema::{first, AnnoRect, AnnotatedImage, AnnotationFile};

/// Which side of the evaluation a file belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    GroundTruth,
    Predictions,
}

/// A loaded sequence with the ignore regions of each frame.
#[derive(Debug, Clone)]
pub struct LoadedSequence {
    pub sequence: Sequence,
    /// Ignore regions, indexed by frame.
    pub ignore_regions: Vec<Vec<Polygon>>,
}

/// Load one sequence file.
///
/// # Arguments
/// * `path` - JSON file in `annolist` format; its stem names the sequence
/// * `source` - Ground truth or predictions
/// * `config` - Supplies the head-size factor
pub fn load_sequence<P: AsRef<Path>>(path: P, source: Source, config: &EvalConfig) -> Result<LoadedSequence> {
    let path = path.as_ref();
    let name = sequence_name(path);

    let contents = fs::read_to_string(path).map_err(|e| {
        Error::IoError(std::io::Error::new(
            e.kind(),
            format!("failed to open annotation file '{}': {}", path.display(), e),
        ))
    })?;
    let file: AnnotationFile = serde_json::from_str(&contents).map_err(|source| Error::Json {
        path: path.display().to_string(),
        source,
    })?;

    let mut frames = Vec::with_capacity(file.annolist.len());
    let mut ignore_regions = Vec::with_capacity(file.annolist.len());
    for (index, image) in file.annolist.iter().enumerate() {
        frames.push(convert_frame(&name, index, image, source, config)?);
        ignore_regions.push(convert_regions(image));
    }

    Ok(LoadedSequence {
        sequence: Sequence::new(name, frames),
        ignore_regions,
    })
}

/// Load and pair one ground-truth file with one prediction file.
pub fn load_pair<P1: AsRef<Path>, P2: AsRef<Path>>(
    gt_path: P1,
    pr_path: P2,
    config: &EvalConfig,
) -> Result<SequencePair> {
    let gt = load_sequence(gt_path, Source::GroundTruth, config)?;
    let mut pr = load_sequence(pr_path, Source::Predictions, config)?;

    // Pair by ground-truth name even if the prediction file was passed explicitly
    pr.sequence.name = gt.sequence.name.clone();

    if gt.sequence.len() != pr.sequence.len() {
        return Err(Error::FrameCountMismatch {
            sequence: gt.sequence.name.clone(),
            ground_truth: gt.sequence.len(),
            predictions: pr.sequence.len(),
        });
    }

    let mut gt_sequence = gt.sequence;
    remove_ignored(&mut gt_sequence.frames, &gt.ignore_regions);
    remove_ignored(&mut pr.sequence.frames, &gt.ignore_regions);

    SequencePair::new(gt_sequence, pr.sequence)
}

/// Load every sequence of a ground-truth directory and its prediction counterpart.
///
/// Sequences are sorted by name. A file present in only one of the two
/// directories is an error.
pub fn load_directories<P1: AsRef<Path>, P2: AsRef<Path>>(
    gt_dir: P1,
    pr_dir: P2,
    config: &EvalConfig,
) -> Result<Vec<SequencePair>> {
    let gt_dir = gt_dir.as_ref();
    let pr_dir = pr_dir.as_ref();

    let gt_files = list_json_files(gt_dir)?;
    let pr_files = list_json_files(pr_dir)?;

    let gt_names: BTreeSet<String> = gt_files.iter().map(|p| file_name(p)).collect();
    let pr_names: BTreeSet<String> = pr_files.iter().map(|p| file_name(p)).collect();

    if let Some(missing) = gt_names.difference(&pr_names).next() {
        return Err(Error::SequenceMismatch(format!(
            "prediction file {} does not exist",
            pr_dir.join(missing).display()
        )));
    }
    if let Some(extra) = pr_names.difference(&gt_names).next() {
        return Err(Error::SequenceMismatch(format!(
            "prediction file {} has no ground truth in {}",
            extra,
            gt_dir.display()
        )));
    }

    info!(sequences = gt_files.len(), "loading annotations");
    let mut pairs = Vec::with_capacity(gt_files.len());
    let mut num_frames = 0;
    for gt_path in &gt_files {
        let pair = load_pair(gt_path, pr_dir.join(file_name(gt_path)), config)?;
        debug!(sequence = pair.name(), frames = pair.num_frames(), "loaded sequence");
        num_frames += pair.num_frames();
        pairs.push(pair);
    }
    info!(frames = num_frames, "loaded annotations");

    Ok(pairs)
}

/// `*.json` files of a directory, sorted by path.
fn list_json_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = fs::read_dir(dir).map_err(|e| {
        Error::IoError(std::io::Error::new(
            e.kind(),
            format!("failed to read directory '{}': {}", dir.display(), e),
        ))
    })?;

    let mut files = Vec::new();
    for entry in entries {
        let path = entry?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "json") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn sequence_name(path: &Path) -> String {
    path.file_stem()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "sequence".to_string())
}

fn convert_frame(
    sequence: &str,
    index: usize,
    image: &AnnotatedImage,
    source: Source,
    config: &EvalConfig,
) -> Result<Frame> {
    let mut persons = Vec::new();
    for rect in image.annorect.iter().flatten() {
        let person = convert_person(sequence, index, rect, source, config)?;
        if !person.is_empty() {
            persons.push(person);
        }
    }

    let evaluate = match source {
        Source::GroundTruth => image
            .is_labeled
            .as_ref()
            .and_then(|f| f.first())
            .map(|f| f.is_set())
            .unwrap_or(true),
        Source::Predictions => true,
    };

    Ok(Frame {
        index,
        image: image
            .image
            .as_ref()
            .and_then(|i| i.first())
            .map(|i| i.name.clone()),
        persons,
        evaluate,
    })
}

fn convert_person(
    sequence: &str,
    frame: usize,
    rect: &AnnoRect,
    source: Source,
    config: &EvalConfig,
) -> Result<Person> {
    let mut person = Person::empty();

    let points = rect
        .annopoints
        .as_ref()
        .and_then(|a| a.first())
        .and_then(|a| a.point.as_ref());

    for point in points.into_iter().flatten() {
        let id = *point
            .id
            .first()
            .ok_or_else(|| Error::annotation(sequence, format!("frame {}: keypoint without id", frame)))?;

        let joint = usize::try_from(id)
            .ok()
            .and_then(Joint::from_index)
            .ok_or_else(|| Error::annotation(sequence, format!("frame {}: invalid joint id {}", frame, id)))?;

        if person.has_joint(joint) {
            return Err(Error::annotation(
                sequence,
                format!("frame {}: duplicate keypoint {} in one person", frame, joint),
            ));
        }

        let (Some(&x), Some(&y)) = (point.x.first(), point.y.first()) else {
            return Err(Error::annotation(
                sequence,
                format!("frame {}: keypoint {} without coordinates", frame, joint),
            ));
        };

        person.set_keypoint(
            joint,
            Some(Keypoint {
                position: Point2::new(x, y),
                score: first(&point.score),
            }),
        );
    }

    person.track_id = first(&rect.track_id);
    match source {
        Source::GroundTruth => {
            if let (Some(x1), Some(y1), Some(x2), Some(y2)) =
                (first(&rect.x1), first(&rect.y1), first(&rect.x2), first(&rect.y2))
            {
                person.scale = Some(head_size(x1, y1, x2, y2, config.head_size_factor));
            }
        }
        Source::Predictions => {
            person.score = first(&rect.score);
        }
    }

    Ok(person)
}

fn convert_regions(image: &AnnotatedImage) -> Vec<Polygon> {
    image
        .ignore_regions
        .iter()
        .flatten()
        .map(|region| {
            let vertices = region
                .point
                .iter()
                .flatten()
                .filter_map(|p| Some(Point2::new(*p.x.first()?, *p.y.first()?)))
                .collect();
            Polygon::new(vertices)
        })
        .collect()
}

/// Remove keypoints inside the frame's ignore regions; drop persons left empty.
fn remove_ignored(frames: &mut [Frame], regions: &[Vec<Polygon>]) {
    for (frame, polygons) in frames.iter_mut().zip(regions) {
        if polygons.is_empty() {
            continue;
        }
        for person in frame.persons.iter_mut() {
            person.retain_keypoints(|k| !polygons.iter().any(|poly| poly.contains(&k.position)));
        }
        frame.persons.retain(|p| !p.is_empty());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::{tempdir, NamedTempFile};

    const GT: &str = r#"{"annolist": [
        {"image": [{"name": "images/seq/000001.jpg"}],
         "is_labeled": [1],
         "ignore_regions": [{"point": [{"x": [100], "y": [100]}, {"x": [200], "y": [100]},
                                       {"x": [200], "y": [200]}, {"x": [100], "y": [200]}]}],
         "annorect": [
            {"x1": [0], "y1": [0], "x2": [30], "y2": [40], "track_id": [0],
             "annopoints": [{"point": [
                {"id": [13], "x": [10], "y": [10]},
                {"id": [12], "x": [150], "y": [150]}]}]},
            {"x1": [0], "y1": [0], "x2": [3], "y2": [4], "track_id": [1], "annopoints": []}
         ]},
        {"image": [{"name": "images/seq/000002.jpg"}], "is_labeled": [0], "annorect": []}
    ]}"#;

    const PRED: &str = r#"{"annolist": [
        {"annorect": [
            {"score": [0.8], "track_id": [5],
             "annopoints": [{"point": [
                {"id": [13], "x": [11], "y": [10], "score": [0.9]},
                {"id": [12], "x": [150], "y": [150], "score": [0.9]}]}]},
            {"score": [0.4], "track_id": [6],
             "annopoints": [{"point": [{"id": [0], "x": [120], "y": [120]}]}]}
        ]},
        {"annorect": []}
    ]}"#;

    fn write_file(dir: &Path, name: &str, contents: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_load_ground_truth_sequence() {
        let dir = tempdir().unwrap();
        let path = write_file(dir.path(), "seq.json", GT);
        let loaded = load_sequence(&path, Source::GroundTruth, &EvalConfig::default()).unwrap();

        let seq = &loaded.sequence;
        assert_eq!(seq.name, "seq");
        assert_eq!(seq.len(), 2);
        assert_eq!(seq.frames[0].image.as_deref(), Some("images/seq/000001.jpg"));
        assert!(seq.frames[0].evaluate);
        assert!(!seq.frames[1].evaluate);

        // The rect without points is dropped
        assert_eq!(seq.frames[0].persons.len(), 1);
        let person = &seq.frames[0].persons[0];
        assert_eq!(person.track_id, Some(0));
        assert!((person.scale.unwrap() - 30.0).abs() < 1e-9);
        assert_eq!(person.num_visible(), 2);

        assert_eq!(loaded.ignore_regions[0].len(), 1);
        assert!(loaded.ignore_regions[1].is_empty());
    }

    #[test]
    fn test_load_pair_removes_ignored_points() {
        let dir = tempdir().unwrap();
        let gt = write_file(dir.path(), "gt.json", GT);
        let pr = write_file(dir.path(), "pr.json", PRED);

        let pair = load_pair(&gt, &pr, &EvalConfig::default()).unwrap();
        assert_eq!(pair.name(), "gt");

        let gt_person = &pair.ground_truth()[0].persons[0];
        assert!(gt_person.has_joint(Joint::Nose));
        assert!(!gt_person.has_joint(Joint::Neck));

        // Second prediction only had a point inside the region
        let preds = &pair.predictions()[0].persons;
        assert_eq!(preds.len(), 1);
        assert_eq!(preds[0].score, Some(0.8));
        assert!(!preds[0].has_joint(Joint::Neck));
    }

    #[test]
    fn test_invalid_joint_id() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"annolist": [{{"annorect": [{{"annopoints": [{{"point": [{{"id": [15], "x": [1], "y": [1]}}]}}]}}]}}]}}"#
        )
        .unwrap();
        let err = load_sequence(file.path(), Source::Predictions, &EvalConfig::default()).unwrap_err();
        assert!(matches!(err, Error::InvalidAnnotation { .. }));
    }

    #[test]
    fn test_duplicate_joint_id() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"annolist": [{{"annorect": [{{"annopoints": [{{"point": [
                {{"id": [1], "x": [1], "y": [1]}}, {{"id": [1], "x": [2], "y": [2]}}]}}]}}]}}]}}"#
        )
        .unwrap();
        let err = load_sequence(file.path(), Source::Predictions, &EvalConfig::default()).unwrap_err();
        assert!(matches!(err, Error::InvalidAnnotation { .. }));
    }

    #[test]
    fn test_frame_count_mismatch() {
        let dir = tempdir().unwrap();
        let gt = write_file(dir.path(), "gt.json", GT);
        let pr = write_file(dir.path(), "pr.json", r#"{"annolist": [{"annorect": []}]}"#);
        match load_pair(&gt, &pr, &EvalConfig::default()).unwrap_err() {
            Error::FrameCountMismatch {
                sequence,
                ground_truth,
                predictions,
            } => {
                assert_eq!(sequence, "gt");
                assert_eq!((ground_truth, predictions), (2, 1));
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_directory_mismatch() {
        let gt_dir = tempdir().unwrap();
        let pr_dir = tempdir().unwrap();
        write_file(gt_dir.path(), "a.json", GT);
        write_file(gt_dir.path(), "b.json", GT);
        write_file(pr_dir.path(), "a.json", PRED);

        let err = load_directories(gt_dir.path(), pr_dir.path(), &EvalConfig::default()).unwrap_err();
        assert!(matches!(err, Error::SequenceMismatch(_)));

        write_file(pr_dir.path(), "b.json", PRED);
        write_file(pr_dir.path(), "c.json", PRED);
        let err = load_directories(gt_dir.path(), pr_dir.path(), &EvalConfig::default()).unwrap_err();
        assert!(matches!(err, Error::SequenceMismatch(_)));
    }

    #[test]
    fn test_load_directories_sorted() {
        let gt_dir = tempdir().unwrap();
        let pr_dir = tempdir().unwrap();
        for name in ["b.json", "a.json"] {
            write_file(gt_dir.path(), name, GT);
            write_file(pr_dir.path(), name, PRED);
        }
        write_file(gt_dir.path(), "notes.txt", "ignored");

        let pairs = load_directories(gt_dir.path(), pr_dir.path(), &EvalConfig::default()).unwrap();
        let names: Vec<&str> = pairs.iter().map(|p| p.name()).collect();
        assert_eq!(names, vec!["a", "b"]);
    }
}
