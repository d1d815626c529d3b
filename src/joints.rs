//! Fixed PoseTrack joint schema.

use std::fmt;

/// Number of joints in every pose.
pub const NUM_JOINTS: usize = 15;

/// A body joint, in PoseTrack annotation index order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Joint {
    RightAnkle = 0,
    RightKnee = 1,
    RightHip = 2,
    LeftHip = 3,
    LeftKnee = 4,
    LeftAnkle = 5,
    RightWrist = 6,
    RightElbow = 7,
    RightShoulder = 8,
    LeftShoulder = 9,
    LeftElbow = 10,
    LeftWrist = 11,
    Neck = 12,
    Nose = 13,
    HeadTop = 14,
}

impl Joint {
    /// All joints in index order.
    pub const ALL: [Joint; NUM_JOINTS] = [
        Joint::RightAnkle,
        Joint::RightKnee,
        Joint::RightHip,
        Joint::LeftHip,
        Joint::LeftKnee,
        Joint::LeftAnkle,
        Joint::RightWrist,
        Joint::RightElbow,
        Joint::RightShoulder,
        Joint::LeftShoulder,
        Joint::LeftElbow,
        Joint::LeftWrist,
        Joint::Neck,
        Joint::Nose,
        Joint::HeadTop,
    ];

    /// Look up a joint by its annotation id.
    pub fn from_index(index: usize) -> Option<Joint> {
        Self::ALL.get(index).copied()
    }

    /// Annotation id of this joint.
    pub fn index(self) -> usize {
        self as usize
    }

    /// Snake-case name used in result files.
    pub fn name(self) -> &'static str {
        match self {
            Joint::RightAnkle => "right_ankle",
            Joint::RightKnee => "right_knee",
            Joint::RightHip => "right_hip",
            Joint::LeftHip => "left_hip",
            Joint::LeftKnee => "left_knee",
            Joint::LeftAnkle => "left_ankle",
            Joint::RightWrist => "right_wrist",
            Joint::RightElbow => "right_elbow",
            Joint::RightShoulder => "right_shoulder",
            Joint::LeftShoulder => "left_shoulder",
            Joint::LeftElbow => "left_elbow",
            Joint::LeftWrist => "left_wrist",
            Joint::Neck => "neck",
            Joint::Nose => "nose",
            Joint::HeadTop => "head_top",
        }
    }

    /// Iterate over all joints in index order.
    pub fn iter() -> impl Iterator<Item = Joint> {
        Self::ALL.into_iter()
    }
}

impl fmt::Display for Joint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Label of the aggregate row appended after the per-joint rows.
pub const TOTAL_LABEL: &str = "total";

/// Row labels of a result table: every joint name followed by [`TOTAL_LABEL`].
pub fn row_names() -> Vec<&'static str> {
    Joint::iter()
        .map(Joint::name)
        .chain(std::iter::once(TOTAL_LABEL))
        .collect()
}

/// Body-part groups used by the summary report (left/right joints merged).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyPart {
    Head,
    Shoulder,
    Elbow,
    Wrist,
    Hip,
    Knee,
    Ankle,
}

impl BodyPart {
    pub const ALL: [BodyPart; 7] = [
        BodyPart::Head,
        BodyPart::Shoulder,
        BodyPart::Elbow,
        BodyPart::Wrist,
        BodyPart::Hip,
        BodyPart::Knee,
        BodyPart::Ankle,
    ];

    /// Joints that make up this body part.
    pub fn joints(self) -> &'static [Joint] {
        match self {
            BodyPart::Head => &[Joint::HeadTop, Joint::Neck, Joint::Nose],
            BodyPart::Shoulder => &[Joint::RightShoulder, Joint::LeftShoulder],
            BodyPart::Elbow => &[Joint::RightElbow, Joint::LeftElbow],
            BodyPart::Wrist => &[Joint::RightWrist, Joint::LeftWrist],
            BodyPart::Hip => &[Joint::RightHip, Joint::LeftHip],
            BodyPart::Knee => &[Joint::RightKnee, Joint::LeftKnee],
            BodyPart::Ankle => &[Joint::RightAnkle, Joint::LeftAnkle],
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            BodyPart::Head => "Head",
            BodyPart::Shoulder => "Shou",
            BodyPart::Elbow => "Elb",
            BodyPart::Wrist => "Wri",
            BodyPart::Hip => "Hip",
            BodyPart::Knee => "Knee",
            BodyPart::Ankle => "Ankl",
        }
    }
}
