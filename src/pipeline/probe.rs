//! File-level metadata probing behind a narrow capability trait, so platform
//! backends can be swapped without touching the enrichment rules.

use std::fs::File;
use std::io::{BufRead, BufReader, Seek};
use std::path::{Path, PathBuf};

use exif::{Field, In, Tag, Value};
use serde_json::Value as Json;
use thiserror::Error;
use tracing::debug;

use crate::models::asset::Location;

/// Which measurements the caller needs. Unrequested ones are not computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ProbeRequest {
    pub dimensions: bool,
    pub duration: bool,
    pub location: bool,
}

impl ProbeRequest {
    pub fn is_empty(&self) -> bool {
        !(self.dimensions || self.duration || self.location)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum GeoTag {
    /// Coordinates read from EXIF GPS tags.
    Exif(Location),
    /// Raw ISO 6709 string from a video container, unparsed.
    Iso6709(String),
}

/// Values a probe could read. `None` means the file held no readable value.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ProbeReport {
    pub width: Option<i64>,
    pub height: Option<i64>,
    pub duration_ms: Option<i64>,
    pub geo: Option<GeoTag>,
}

#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("could not open {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub trait MediaProbe: Send + Sync {
    fn probe(&self, path: &Path, is_video: bool, request: ProbeRequest) -> Result<ProbeReport, ProbeError>;
}

/// Probe backed by the local filesystem: header-only image decoding, EXIF
/// for photo locations and `ffprobe` for videos.
#[derive(Debug, Clone)]
pub struct FsProbe {
    ffprobe: String,
}

impl Default for FsProbe {
    fn default() -> Self {
        Self::new("ffprobe")
    }
}

impl FsProbe {
    pub fn new(ffprobe: impl Into<String>) -> Self {
        Self { ffprobe: ffprobe.into() }
    }

    fn probe_video(&self, path: &Path) -> ProbeReport {
        let path_str = path.to_string_lossy();
        let args = ["-v", "quiet", "-print_format", "json", "-show_streams", "-show_format", path_str.as_ref()];
        match crate::utils::exec::exec_capture(&self.ffprobe, &args) {
            Ok((0, stdout, _)) => match serde_json::from_slice::<Json>(&stdout) {
                Ok(v) => parse_ffprobe(&v),
                Err(e) => {
                    debug!(path = %path.display(), error = %e, "unparseable ffprobe output");
                    ProbeReport::default()
                }
            },
            Ok((code, _, _)) => {
                debug!(path = %path.display(), code, "ffprobe failed");
                ProbeReport::default()
            }
            Err(e) => {
                debug!(path = %path.display(), error = %e, "could not run ffprobe");
                ProbeReport::default()
            }
        }
    }
}

impl MediaProbe for FsProbe {
    fn probe(&self, path: &Path, is_video: bool, request: ProbeRequest) -> Result<ProbeReport, ProbeError> {
        let file = File::open(path).map_err(|source| ProbeError::Open { path: path.to_path_buf(), source })?;
        if request.is_empty() {
            return Ok(ProbeReport::default());
        }
        if is_video {
            // ffprobe reopens by path; the handle above only proves readability
            drop(file);
            return Ok(self.probe_video(path));
        }

        let mut reader = BufReader::new(file);
        let mut report = ProbeReport::default();
        if request.dimensions {
            match read_dimensions(&mut reader) {
                Some((w, h)) => {
                    report.width = Some(w);
                    report.height = Some(h);
                }
                None => debug!(path = %path.display(), "could not decode image header"),
            }
        }
        if request.location && reader.rewind().is_ok() {
            report.geo = read_exif_location(&mut reader).map(GeoTag::Exif);
        }
        Ok(report)
    }
}

fn read_dimensions<R: BufRead + Seek>(reader: &mut R) -> Option<(i64, i64)> {
    let (w, h) = image::io::Reader::new(reader).with_guessed_format().ok()?.into_dimensions().ok()?;
    Some((w as i64, h as i64))
}

fn read_exif_location<R: BufRead + Seek>(reader: &mut R) -> Option<Location> {
    let exif = exif::Reader::new().read_from_container(reader).ok()?;
    gps_location(exif.fields().filter(|f| f.ifd_num == In::PRIMARY))
}

fn rationals(field: Option<&&Field>) -> Option<Vec<f64>> {
    match &field?.value {
        Value::Rational(v) if !v.is_empty() => {
            let out: Vec<f64> = v.iter().map(|r| r.to_f64()).collect();
            out.iter().all(|x| x.is_finite()).then_some(out)
        }
        _ => None,
    }
}

fn ascii_ref(field: Option<&&Field>) -> Option<u8> {
    match &field?.value {
        Value::Ascii(v) => v.first()?.first().copied(),
        _ => None,
    }
}

fn degrees(dms: &[f64]) -> f64 {
    dms[0] + dms.get(1).copied().unwrap_or(0.0) / 60.0 + dms.get(2).copied().unwrap_or(0.0) / 3600.0
}

/// Build a location from EXIF GPS fields. Latitude and longitude are required;
/// altitude, heading and speed (converted to m/s) are filled when present.
pub fn gps_location<'a, I>(fields: I) -> Option<Location>
where
    I: IntoIterator<Item = &'a Field>,
{
    let fields: Vec<&Field> = fields.into_iter().collect();
    let find = |tag: Tag| fields.iter().find(|f| f.tag == tag);

    let mut lat = degrees(&rationals(find(Tag::GPSLatitude))?);
    let mut lon = degrees(&rationals(find(Tag::GPSLongitude))?);
    if ascii_ref(find(Tag::GPSLatitudeRef)) == Some(b'S') {
        lat = -lat;
    }
    if ascii_ref(find(Tag::GPSLongitudeRef)) == Some(b'W') {
        lon = -lon;
    }
    let mut loc = Location::new(lat, lon);

    if let Some(alt) = rationals(find(Tag::GPSAltitude)) {
        let below = matches!(find(Tag::GPSAltitudeRef).map(|f| &f.value), Some(Value::Byte(b)) if b.first() == Some(&1));
        loc.altitude = Some(if below { -alt[0] } else { alt[0] });
    }
    loc.heading = rationals(find(Tag::GPSImgDirection)).map(|v| v[0]);
    if let Some(speed) = rationals(find(Tag::GPSSpeed)) {
        let factor = match ascii_ref(find(Tag::GPSSpeedRef)) {
            Some(b'M') => 0.44704,
            Some(b'N') => 0.514_444,
            _ => 1.0 / 3.6,
        };
        loc.speed = Some(speed[0] * factor);
    }
    Some(loc)
}

fn parse_duration_ms(v: &Json) -> Option<i64> {
    if let Some(s) = v.as_str() {
        if let Ok(f) = s.parse::<f64>() {
            return Some((f * 1000.0) as i64);
        }
    }
    v.as_f64().map(|n| (n * 1000.0) as i64)
}

/// Extract the first video stream's size, the container duration and any
/// ISO 6709 location tag from `ffprobe -print_format json` output.
pub fn parse_ffprobe(v: &Json) -> ProbeReport {
    let mut report = ProbeReport::default();
    if let Some(streams) = v.get("streams").and_then(|x| x.as_array()) {
        if let Some(s) = streams.iter().find(|s| s.get("codec_type").and_then(|c| c.as_str()) == Some("video")) {
            report.width = s.get("width").and_then(|x| x.as_i64()).filter(|w| *w > 0);
            report.height = s.get("height").and_then(|x| x.as_i64()).filter(|h| *h > 0);
        }
    }
    let format = v.get("format");
    report.duration_ms = format.and_then(|f| f.get("duration")).and_then(parse_duration_ms);
    report.geo = format
        .and_then(|f| f.get("tags"))
        .and_then(|t| t.get("location").or_else(|| t.get("com.apple.quicktime.location.ISO6709")))
        .and_then(|l| l.as_str())
        .map(|s| GeoTag::Iso6709(s.to_string()));
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use exif::Rational;

    fn field(tag: Tag, value: Value) -> Field {
        Field { tag, ifd_num: In::PRIMARY, value }
    }

    fn dms(d: u32, m: u32, s_hundredths: u32) -> Value {
        Value::Rational(vec![
            Rational { num: d, denom: 1 },
            Rational { num: m, denom: 1 },
            Rational { num: s_hundredths, denom: 100 },
        ])
    }

    #[test]
    fn test_gps_location_with_refs() {
        let fields = vec![
            field(Tag::GPSLatitude, dms(33, 52, 0)),
            field(Tag::GPSLatitudeRef, Value::Ascii(vec![b"S".to_vec()])),
            field(Tag::GPSLongitude, dms(151, 12, 3600)),
            field(Tag::GPSLongitudeRef, Value::Ascii(vec![b"E".to_vec()])),
            field(Tag::GPSAltitude, Value::Rational(vec![Rational { num: 25, denom: 2 }])),
            field(Tag::GPSAltitudeRef, Value::Byte(vec![1])),
            field(Tag::GPSSpeed, Value::Rational(vec![Rational { num: 36, denom: 1 }])),
            field(Tag::GPSSpeedRef, Value::Ascii(vec![b"K".to_vec()])),
        ];
        let loc = gps_location(&fields).unwrap();
        assert!((loc.latitude + (33.0 + 52.0 / 60.0)).abs() < 1e-9);
        assert!((loc.longitude - (151.0 + 12.0 / 60.0 + 36.0 / 3600.0)).abs() < 1e-9);
        assert_eq!(loc.altitude, Some(-12.5));
        assert!((loc.speed.unwrap() - 10.0).abs() < 1e-9);
        assert_eq!(loc.heading, None);
    }

    #[test]
    fn test_gps_location_requires_both_axes() {
        let fields = vec![field(Tag::GPSLatitude, dms(10, 0, 0))];
        assert!(gps_location(&fields).is_none());
        assert!(gps_location(&Vec::<Field>::new()).is_none());
    }

    #[test]
    fn test_parse_ffprobe() {
        let v = serde_json::json!({
            "streams": [
                {"codec_type": "audio", "codec_name": "aac"},
                {"codec_type": "video", "width": 1920, "height": 1080}
            ],
            "format": {"duration": "12.480000", "tags": {"location": "+37.7749-122.4194/"}}
        });
        let r = parse_ffprobe(&v);
        assert_eq!((r.width, r.height), (Some(1920), Some(1080)));
        assert_eq!(r.duration_ms, Some(12_480));
        assert_eq!(r.geo, Some(GeoTag::Iso6709("+37.7749-122.4194/".into())));
    }

    #[test]
    fn test_parse_ffprobe_without_video_stream() {
        let r = parse_ffprobe(&serde_json::json!({"streams": [], "format": {}}));
        assert_eq!(r, ProbeReport::default());
    }

    #[test]
    fn test_fs_probe_reads_png_header() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("wide.png");
        image::RgbImage::new(4, 2).save(&path).unwrap();
        let req = ProbeRequest { dimensions: true, location: true, ..Default::default() };
        let report = FsProbe::default().probe(&path, false, req).unwrap();
        assert_eq!((report.width, report.height), (Some(4), Some(2)));
        assert_eq!(report.geo, None);
    }

    /// Baseline JPEG with an APP1 EXIF segment carrying `fields`.
    fn jpeg_with_exif(w: u32, h: u32, fields: &[Field]) -> Vec<u8> {
        let mut jpeg = Vec::new();
        image::DynamicImage::ImageRgb8(image::RgbImage::new(w, h))
            .write_to(&mut std::io::Cursor::new(&mut jpeg), image::ImageOutputFormat::Jpeg(90))
            .unwrap();
        let mut writer = exif::experimental::Writer::new();
        for f in fields {
            writer.push_field(f);
        }
        let mut tiff = std::io::Cursor::new(Vec::new());
        writer.write(&mut tiff, false).unwrap();
        let mut payload = b"Exif\0\0".to_vec();
        payload.extend_from_slice(&tiff.into_inner());

        let mut out = jpeg[..2].to_vec();
        out.extend_from_slice(&[0xFF, 0xE1]);
        out.extend_from_slice(&((payload.len() + 2) as u16).to_be_bytes());
        out.extend_from_slice(&payload);
        out.extend_from_slice(&jpeg[2..]);
        out
    }

    #[test]
    fn test_reads_gps_from_jpeg_exif() {
        let fields = vec![
            field(Tag::GPSLatitudeRef, Value::Ascii(vec![b"N".to_vec()])),
            field(Tag::GPSLatitude, dms(48, 51, 2900)),
            field(Tag::GPSLongitudeRef, Value::Ascii(vec![b"W".to_vec()])),
            field(Tag::GPSLongitude, dms(2, 17, 4000)),
            field(Tag::GPSImgDirection, Value::Rational(vec![Rational { num: 180, denom: 1 }])),
        ];
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("geo.jpg");
        std::fs::write(&path, jpeg_with_exif(6, 4, &fields)).unwrap();

        // dimensions first, so the location read has to rewind
        let req = ProbeRequest { dimensions: true, location: true, ..Default::default() };
        let report = FsProbe::default().probe(&path, false, req).unwrap();
        assert_eq!((report.width, report.height), (Some(6), Some(4)));
        match report.geo {
            Some(GeoTag::Exif(loc)) => {
                assert!((loc.latitude - (48.0 + 51.0 / 60.0 + 29.0 / 3600.0)).abs() < 1e-9);
                assert!((loc.longitude + (2.0 + 17.0 / 60.0 + 40.0 / 3600.0)).abs() < 1e-9);
                assert_eq!(loc.heading, Some(180.0));
            }
            other => panic!("unexpected geo: {:?}", other),
        }

        let req = ProbeRequest { location: true, ..Default::default() };
        let report = FsProbe::default().probe(&path, false, req).unwrap();
        assert_eq!(report.width, None);
        assert!(matches!(report.geo, Some(GeoTag::Exif(_))));
    }

    #[test]
    fn test_fs_probe_missing_file_is_open_error() {
        let req = ProbeRequest { dimensions: true, ..Default::default() };
        let err = FsProbe::default().probe(Path::new("/nonexistent/a.jpg"), false, req).unwrap_err();
        assert!(matches!(err, ProbeError::Open { .. }));
    }

    #[test]
    fn test_fs_probe_garbage_has_no_dimensions() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("broken.jpg");
        std::fs::write(&path, b"NOT AN IMAGE FILE").unwrap();
        let req = ProbeRequest { dimensions: true, ..Default::default() };
        let report = FsProbe::default().probe(&path, false, req).unwrap();
        assert_eq!(report.width, None);
    }

    #[test]
    fn test_fs_probe_video_without_ffprobe() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("clip.mp4");
        std::fs::write(&path, b"not really a video").unwrap();
        let req = ProbeRequest { dimensions: true, duration: true, location: false };
        let report = FsProbe::new("definitely-not-ffprobe-4242").probe(&path, true, req).unwrap();
        assert_eq!(report, ProbeReport::default());
    }
}
