use std::fmt;

use crate::{
    Config,
    error::ReportError,
    imagery::{CameraSource, FrameCaptureSource, ImageSource, ThumbnailSource},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceKind {
    Thumbnail,
    Frame,
    Camera,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Thumbnail => "thumbnail",
            SourceKind::Frame => "frame",
            SourceKind::Camera => "camera",
        }
    }

    pub const fn all() -> &'static [SourceKind] {
        &[SourceKind::Thumbnail, SourceKind::Frame, SourceKind::Camera]
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for SourceKind {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let lower = value.to_lowercase();

        match lower.as_str() {
            "thumbnail" => Ok(SourceKind::Thumbnail),
            "frame" => Ok(SourceKind::Frame),
            "camera" => Ok(SourceKind::Camera),
            _ => Err(anyhow::anyhow!(
                "Unknown image source '{value}'. Supported sources: thumbnail, frame, camera."
            )),
        }
    }
}

/// Construct the image source selected by `config.source.kind`.
pub fn image_source_from_config(config: &Config) -> Result<Box<dyn ImageSource>, ReportError> {
    let invalid = |e: anyhow::Error| ReportError::Config(ReportError::chain(&e));
    let kind = config.source_kind().map_err(invalid)?;
    let tz = config.timezone().map_err(invalid)?;
    let src = &config.source;

    let boxed: Box<dyn ImageSource> = match kind {
        SourceKind::Thumbnail => {
            let api_key = config
                .youtube_api_key()
                .ok_or(ReportError::MissingCredential("youtube_api_key"))?;
            Box::new(ThumbnailSource::new(
                &src.youtube_api_base,
                api_key,
                &src.video_id,
                &config.output.capture_dir,
                tz,
            ))
        }
        SourceKind::Frame => Box::new(FrameCaptureSource::new(
            &src.video_id,
            &src.resolver_program,
            &src.ffmpeg_program,
            &config.output.capture_dir,
            tz,
        )),
        SourceKind::Camera => Box::new(CameraSource::new(src.camera_urls.clone())),
    };

    log::debug!("Image source: {kind}");
    Ok(boxed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_kind_as_str_roundtrip() {
        for kind in SourceKind::all() {
            let parsed = SourceKind::try_from(kind.as_str()).expect("roundtrip should succeed");
            assert_eq!(*kind, parsed);
        }
        assert_eq!(SourceKind::try_from("CAMERA").unwrap(), SourceKind::Camera);
    }

    #[test]
    fn unknown_source_error() {
        let err = SourceKind::try_from("webcam").unwrap_err();
        assert!(err.to_string().contains("Unknown image source"));
    }

    #[test]
    fn thumbnail_source_requires_youtube_key() {
        let cfg = Config::default();
        let err = image_source_from_config(&cfg).unwrap_err();
        assert!(matches!(err, ReportError::MissingCredential("youtube_api_key")));
    }

    #[test]
    fn thumbnail_source_builds_with_key() {
        let mut cfg = Config::default();
        cfg.set_youtube_api_key("KEY".into());
        assert!(image_source_from_config(&cfg).is_ok());
    }

    #[test]
    fn frame_and_camera_need_no_credentials() {
        let mut cfg = Config::default();
        cfg.source.kind = "frame".into();
        assert!(image_source_from_config(&cfg).is_ok());

        cfg.source.kind = "camera".into();
        cfg.source.camera_urls = vec!["https://cam/a.jpg".into()];
        assert!(image_source_from_config(&cfg).is_ok());
    }

    #[test]
    fn bad_kind_is_config_error() {
        let mut cfg = Config::default();
        cfg.source.kind = "webcam".into();
        let err = image_source_from_config(&cfg).unwrap_err();
        assert!(matches!(err, ReportError::Config(_)));
    }
}
