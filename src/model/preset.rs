use std::fmt;

/// Named compression level selected by the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum QualityLevel {
    Maximum,
    High,
    #[default]
    Medium,
    Low,
}

impl QualityLevel {
    pub const ALL: [QualityLevel; 4] = [
        QualityLevel::Maximum,
        QualityLevel::High,
        QualityLevel::Medium,
        QualityLevel::Low,
    ];

    /// Parse a level key, ignoring case. Unknown keys resolve to `Medium`.
    pub fn parse_or_default(key: &str) -> Self {
        match key.trim().to_ascii_lowercase().as_str() {
            "maximum" => QualityLevel::Maximum,
            "high" => QualityLevel::High,
            "medium" => QualityLevel::Medium,
            "low" => QualityLevel::Low,
            _ => QualityLevel::Medium,
        }
    }

    pub fn key(&self) -> &'static str {
        match self {
            QualityLevel::Maximum => "maximum",
            QualityLevel::High => "high",
            QualityLevel::Medium => "medium",
            QualityLevel::Low => "low",
        }
    }

    pub fn preset(&self) -> &'static QualityPreset {
        match self {
            QualityLevel::Maximum => &MAXIMUM,
            QualityLevel::High => &HIGH,
            QualityLevel::Medium => &MEDIUM,
            QualityLevel::Low => &LOW,
        }
    }
}

impl fmt::Display for QualityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Target resolution, image quality and Ghostscript setting for one level
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QualityPreset {
    pub level: QualityLevel,
    pub label: &'static str,
    pub dpi: u32,
    /// JPEG quality, 0-100
    pub image_quality: u8,
    /// Value passed as `-dPDFSETTINGS`
    pub gs_setting: &'static str,
}

impl QualityPreset {
    /// Largest pixel dimension an embedded image may keep in the fallback path.
    pub fn max_image_dimension(&self) -> u32 {
        self.dpi * crate::config::defaults::IMAGE_PIXELS_PER_DPI
    }
}

static MAXIMUM: QualityPreset = QualityPreset {
    level: QualityLevel::Maximum,
    label: "Maximum Compression",
    dpi: 72,
    image_quality: 30,
    gs_setting: "/screen",
};

static HIGH: QualityPreset = QualityPreset {
    level: QualityLevel::High,
    label: "High Compression",
    dpi: 150,
    image_quality: 50,
    gs_setting: "/ebook",
};

static MEDIUM: QualityPreset = QualityPreset {
    level: QualityLevel::Medium,
    label: "Medium Compression",
    dpi: 200,
    image_quality: 70,
    gs_setting: "/printer",
};

static LOW: QualityPreset = QualityPreset {
    level: QualityLevel::Low,
    label: "Low Compression",
    dpi: 300,
    image_quality: 85,
    gs_setting: "/prepress",
};

/// Look up a preset by level key. Never fails: unknown keys get the medium preset.
pub fn get_preset(level: &str) -> &'static QualityPreset {
    QualityLevel::parse_or_default(level).preset()
}
