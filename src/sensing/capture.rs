use async_trait::async_trait;
use chrono::{DateTime, Local};
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::DynamicImage;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use crate::error::{Result, SnitchError};

pub const MAX_CAPTURE_WIDTH: u32 = 1280;
const JPEG_QUALITY: u8 = 80;
const CAPTURE_COMMAND_ENV: &str = "SNITCH_CAPTURE_COMMAND";

/// One full-screen capture, re-encoded as JPEG for the classifier.
#[derive(Debug, Clone)]
pub struct ImageSample {
    pub captured_at: DateTime<Local>,
    pub bytes: Vec<u8>,
}

impl ImageSample {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self {
            captured_at: Local::now(),
            bytes,
        }
    }
}

#[async_trait]
pub trait Capturer: Send + Sync {
    async fn capture(&self) -> Result<ImageSample>;
}

/// Shells out to a platform screenshot tool that writes an image file,
/// then downsizes and re-encodes the result.
pub struct CommandCapturer {
    program: String,
    args: Vec<String>,
    scratch_path: PathBuf,
    max_width: u32,
}

impl CommandCapturer {
    pub fn new(program: impl Into<String>, args: Vec<String>, scratch_path: PathBuf) -> Self {
        Self {
            program: program.into(),
            args,
            scratch_path,
            max_width: MAX_CAPTURE_WIDTH,
        }
    }

    /// `screencapture` on macOS, `grim` elsewhere. `SNITCH_CAPTURE_COMMAND`
    /// overrides both; the output path is appended as the last argument.
    pub fn platform_default(scratch_path: PathBuf) -> Self {
        if let Ok(command) = std::env::var(CAPTURE_COMMAND_ENV) {
            let mut parts = command.split_whitespace().map(str::to_string);
            if let Some(program) = parts.next() {
                return Self::new(program, parts.collect(), scratch_path);
            }
        }

        if cfg!(target_os = "macos") {
            Self::new(
                "screencapture",
                vec!["-x".into(), "-t".into(), "png".into()],
                scratch_path,
            )
        } else {
            Self::new("grim", Vec::new(), scratch_path)
        }
    }
}

#[async_trait]
impl Capturer for CommandCapturer {
    async fn capture(&self) -> Result<ImageSample> {
        let status = tokio::process::Command::new(&self.program)
            .args(&self.args)
            .arg(&self.scratch_path)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .map_err(|err| {
                SnitchError::CaptureUnavailable(format!("failed to run {}: {err}", self.program))
            })?;

        if !status.success() {
            return Err(SnitchError::CaptureUnavailable(format!(
                "{} exited with {status}",
                self.program
            )));
        }

        let raw = tokio::fs::read(&self.scratch_path).await.map_err(|err| {
            SnitchError::CaptureUnavailable(format!(
                "screenshot missing at {}: {err}",
                self.scratch_path.display()
            ))
        })?;
        let _ = tokio::fs::remove_file(&self.scratch_path).await;

        let max_width = self.max_width;
        let bytes = tokio::task::spawn_blocking(move || encode_for_classifier(&raw, max_width))
            .await
            .map_err(|err| SnitchError::CaptureUnavailable(format!("encoder join failed: {err}")))??;

        Ok(ImageSample::new(bytes))
    }
}

/// Decode any supported image, shrink it to `max_width` keeping the aspect
/// ratio, and return it as JPEG.
pub fn encode_for_classifier(raw: &[u8], max_width: u32) -> Result<Vec<u8>> {
    let decoded = image::load_from_memory(raw)
        .map_err(|err| SnitchError::CaptureUnavailable(format!("undecodable screenshot: {err}")))?;

    let resized = if decoded.width() > max_width {
        decoded.resize(max_width, u32::MAX, FilterType::Triangle)
    } else {
        decoded
    };

    let rgb = DynamicImage::ImageRgb8(resized.to_rgb8());
    let mut out = Vec::new();
    rgb.write_with_encoder(JpegEncoder::new_with_quality(&mut out, JPEG_QUALITY))
        .map_err(|err| SnitchError::CaptureUnavailable(format!("jpeg encode failed: {err}")))?;
    Ok(out)
}

/// Keep a copy of a capture as `screenshot_YYYYmmdd_HHMMSS.jpg` under `dir`.
pub async fn archive_screenshot(dir: &Path, sample: &ImageSample) -> anyhow::Result<PathBuf> {
    use anyhow::Context as _;

    tokio::fs::create_dir_all(dir)
        .await
        .with_context(|| format!("failed to create screenshot dir {}", dir.display()))?;
    let path = dir.join(format!(
        "screenshot_{}.jpg",
        sample.captured_at.format("%Y%m%d_%H%M%S")
    ));
    tokio::fs::write(&path, &sample.bytes)
        .await
        .with_context(|| format!("failed to write {}", path.display()))?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgba, RgbaImage};
    use std::io::Cursor;

    fn png(width: u32, height: u32) -> Vec<u8> {
        let img = RgbaImage::from_pixel(width, height, Rgba([40, 120, 200, 255]));
        let mut buf = Vec::new();
        DynamicImage::ImageRgba8(img)
            .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
            .unwrap();
        buf
    }

    #[test]
    fn wide_capture_is_shrunk_to_max_width() {
        let jpeg = encode_for_classifier(&png(2560, 400), MAX_CAPTURE_WIDTH).unwrap();
        assert_eq!(&jpeg[..2], &[0xFF, 0xD8]);

        let decoded = image::load_from_memory(&jpeg).unwrap();
        assert_eq!(decoded.width(), 1280);
        assert_eq!(decoded.height(), 200);
    }

    #[test]
    fn small_capture_keeps_its_size() {
        let jpeg = encode_for_classifier(&png(64, 32), MAX_CAPTURE_WIDTH).unwrap();
        let decoded = image::load_from_memory(&jpeg).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (64, 32));
    }

    #[test]
    fn garbage_is_capture_unavailable() {
        let err = encode_for_classifier(b"not an image", MAX_CAPTURE_WIDTH).unwrap_err();
        assert!(matches!(err, SnitchError::CaptureUnavailable(_)));
    }

    #[tokio::test]
    async fn missing_tool_is_capture_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let capturer = CommandCapturer::new(
            "snitch-no-such-screenshot-tool",
            Vec::new(),
            dir.path().join("capture.png"),
        );
        let err = capturer.capture().await.unwrap_err();
        assert!(matches!(err, SnitchError::CaptureUnavailable(_)));
    }

    #[tokio::test]
    async fn archived_screenshot_uses_timestamped_name() {
        let dir = tempfile::tempdir().unwrap();
        let sample = ImageSample::new(vec![0xFF, 0xD8, 0xFF, 0xD9]);
        let path = archive_screenshot(dir.path(), &sample).await.unwrap();

        let name = path.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("screenshot_") && name.ends_with(".jpg"));
        assert_eq!(std::fs::read(&path).unwrap(), sample.bytes);
    }
}
