//! PNG normalization for PDF image XObjects.

use digest_core::{Error, Result};
use flate2::read::ZlibDecoder;
use image::{DynamicImage, GrayImage, ImageFormat, RgbImage};
use lopdf::{Dictionary, Document, Object, Stream};
use std::io::{Cursor, Read};

/// How an image stream's bytes are encoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SampleFilter {
    /// Uncompressed samples.
    Raw,
    /// Zlib-compressed samples.
    Flate,
    /// A complete JPEG file.
    Jpeg,
    /// Anything else, by filter name.
    Unsupported(String),
}

impl SampleFilter {
    /// Classify a PDF filter chain.
    pub fn from_filters(filters: &[String]) -> Self {
        match filters {
            [] => Self::Raw,
            [only] if only == "FlateDecode" => Self::Flate,
            [only] if only == "DCTDecode" => Self::Jpeg,
            other => Self::Unsupported(other.join(", ")),
        }
    }
}

/// How samples map to colors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColorSpace {
    Gray,
    Rgb,
    Cmyk,
    /// One index per pixel into a lookup table of `base` colors.
    Indexed {
        base: Box<ColorSpace>,
        palette: Vec<u8>,
    },
    /// A space we recognize but do not convert.
    Unsupported(String),
    /// Absent or named through page resources; components are inferred.
    Unknown,
}

impl ColorSpace {
    /// Parse a `/ColorSpace` entry, following references.
    pub fn from_object(document: &Document, object: &Object) -> Result<Self> {
        let object = resolve(document, object)?;
        match object {
            Object::Name(name) => Ok(Self::from_name(name)),
            Object::Array(array) => Self::from_array(document, array),
            _ => Ok(Self::Unknown),
        }
    }

    fn from_name(name: &[u8]) -> Self {
        match name {
            b"DeviceGray" | b"CalGray" | b"G" => Self::Gray,
            b"DeviceRGB" | b"CalRGB" | b"RGB" => Self::Rgb,
            b"DeviceCMYK" | b"CMYK" => Self::Cmyk,
            b"Indexed" | b"I" | b"Separation" | b"DeviceN" | b"Pattern" | b"Lab" => {
                Self::Unsupported(String::from_utf8_lossy(name).to_string())
            }
            _ => Self::Unknown,
        }
    }

    fn from_array(document: &Document, array: &[Object]) -> Result<Self> {
        let family = match array.first().map(|o| resolve(document, o)) {
            Some(Ok(Object::Name(name))) => name.as_slice(),
            _ => return Ok(Self::Unknown),
        };

        match family {
            b"CalGray" => Ok(Self::Gray),
            b"CalRGB" => Ok(Self::Rgb),
            b"ICCBased" => {
                let components = array
                    .get(1)
                    .and_then(|o| resolve(document, o).ok())
                    .and_then(|o| o.as_stream().ok())
                    .and_then(|s| s.dict.get(b"N").and_then(Object::as_i64).ok());
                Ok(match components {
                    Some(1) => Self::Gray,
                    Some(3) => Self::Rgb,
                    Some(4) => Self::Cmyk,
                    _ => Self::Unknown,
                })
            }
            b"Indexed" | b"I" => Self::indexed(document, array),
            other => Ok(Self::Unsupported(String::from_utf8_lossy(other).to_string())),
        }
    }

    /// `[/Indexed base hival lookup]`
    fn indexed(document: &Document, array: &[Object]) -> Result<Self> {
        let [_, base, hival, lookup] = array else {
            return Err(Error::ImageError(format!(
                "Indexed color space has {} entries",
                array.len()
            )));
        };

        let base = Self::from_object(document, base)?;
        let components = base.components().ok_or_else(|| {
            Error::ImageError(format!("Unsupported indexed base color space: {:?}", base))
        })?;
        let hival = resolve(document, hival)?
            .as_i64()
            .map_err(|e| Error::ImageError(format!("Invalid palette size: {}", e)))?;

        let mut palette = match resolve(document, lookup)? {
            Object::String(bytes, _) => bytes.clone(),
            Object::Stream(stream) => stream
                .get_plain_content()
                .map_err(|e| Error::ImageError(format!("Unreadable palette: {}", e)))?,
            _ => return Err(Error::ImageError("Palette lookup is not a string or stream".to_string())),
        };
        let entries = usize::try_from(hival)
            .ok()
            .and_then(|h| h.checked_add(1))
            .ok_or_else(|| Error::ImageError(format!("Invalid palette size: {}", hival)))?;
        palette.truncate(entries.saturating_mul(components));

        Ok(Self::Indexed {
            base: Box::new(base),
            palette,
        })
    }

    /// Samples per pixel for the directly convertible spaces.
    fn components(&self) -> Option<usize> {
        match self {
            Self::Gray => Some(1),
            Self::Rgb => Some(3),
            Self::Cmyk => Some(4),
            _ => None,
        }
    }
}

/// Image stream contents plus the dictionary entries needed to decode them.
#[derive(Debug, Clone)]
pub struct ImageSamples<'a> {
    pub width: i64,
    pub height: i64,
    pub color_space: ColorSpace,
    pub bits_per_component: Option<i64>,
    pub filter: SampleFilter,
    pub data: &'a [u8],
}

impl<'a> ImageSamples<'a> {
    /// Read an image XObject's dictionary.
    pub fn from_stream(document: &Document, stream: &'a Stream) -> Result<Self> {
        let dict = &stream.dict;
        let width = required_i64(document, dict, b"Width")?;
        let height = required_i64(document, dict, b"Height")?;

        let bits_per_component = match dict.get(b"BitsPerComponent") {
            Ok(bits) => Some(
                resolve(document, bits)?
                    .as_i64()
                    .map_err(|e| Error::ImageError(format!("Invalid /BitsPerComponent: {}", e)))?,
            ),
            Err(_) => None,
        };

        let color_space = match dict.get(b"ColorSpace") {
            Ok(space) => ColorSpace::from_object(document, space)?,
            Err(_) => ColorSpace::Unknown,
        };

        Ok(Self {
            width,
            height,
            color_space,
            bits_per_component,
            filter: SampleFilter::from_filters(&filter_names(document, dict)),
            data: &stream.content,
        })
    }

    /// Decode and re-encode as PNG.
    pub fn to_png(&self) -> Result<Vec<u8>> {
        if let ColorSpace::Unsupported(name) = &self.color_space {
            return Err(Error::ImageError(format!(
                "Unsupported color space: {}",
                name
            )));
        }

        let decoded = match &self.filter {
            SampleFilter::Raw => self.interpret(self.data.to_vec())?,
            SampleFilter::Flate => {
                let mut decompressed = Vec::new();
                ZlibDecoder::new(self.data)
                    .read_to_end(&mut decompressed)
                    .map_err(|e| Error::ImageError(format!("Decompression failed: {}", e)))?;
                self.interpret(decompressed)?
            }
            SampleFilter::Jpeg => image::load_from_memory_with_format(self.data, ImageFormat::Jpeg)
                .map_err(|e| Error::ImageError(format!("JPEG decode failed: {}", e)))?,
            SampleFilter::Unsupported(name) => {
                return Err(Error::ImageError(format!(
                    "Unsupported image filter: {}",
                    name
                )));
            }
        };

        let mut png = Vec::new();
        decoded
            .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
            .map_err(|e| Error::ImageError(format!("PNG encoding failed: {}", e)))?;
        Ok(png)
    }

    /// Interpret decoded samples using the color space and dimensions.
    fn interpret(&self, samples: Vec<u8>) -> Result<DynamicImage> {
        let bits = self.bits_per_component.unwrap_or(8);
        if bits != 8 {
            return Err(Error::ImageError(format!(
                "Unsupported bits per component: {}",
                bits
            )));
        }

        let width = u32::try_from(self.width)
            .map_err(|_| Error::ImageError(format!("Invalid width: {}", self.width)))?;
        let height = u32::try_from(self.height)
            .map_err(|_| Error::ImageError(format!("Invalid height: {}", self.height)))?;
        let pixels = (width as usize)
            .checked_mul(height as usize)
            .ok_or_else(|| Error::ImageError(format!("Image too large: {}x{}", width, height)))?;
        if pixels == 0 {
            return Err(Error::ImageError("Image has no pixels".to_string()));
        }

        let (space, samples) = match &self.color_space {
            ColorSpace::Indexed { base, palette } => {
                let indices = take_samples(samples, pixels, 1)?;
                let components = base.components().unwrap_or(1);
                (base.as_ref(), expand_palette(&indices, components, palette)?)
            }
            other => (other, samples),
        };

        let components = match space.components() {
            Some(n) => n,
            // Resource-named spaces: infer from the sample count.
            None => samples.len() / pixels,
        };
        let samples = take_samples(samples, pixels, components)?;

        let image = match components {
            1 => GrayImage::from_raw(width, height, samples).map(DynamicImage::ImageLuma8),
            3 => RgbImage::from_raw(width, height, samples).map(DynamicImage::ImageRgb8),
            4 => RgbImage::from_raw(width, height, cmyk_to_rgb(&samples))
                .map(DynamicImage::ImageRgb8),
            n => {
                return Err(Error::ImageError(format!(
                    "Unsupported component count: {}",
                    n
                )));
            }
        };

        image.ok_or_else(|| Error::ImageError("Failed to create image from raw data".to_string()))
    }
}

fn resolve<'d>(document: &'d Document, object: &'d Object) -> Result<&'d Object> {
    document
        .dereference(object)
        .map(|(_, object)| object)
        .map_err(|e| Error::ImageError(format!("Unresolvable reference: {}", e)))
}

fn required_i64(document: &Document, dict: &Dictionary, key: &[u8]) -> Result<i64> {
    let name = String::from_utf8_lossy(key);
    let value = dict
        .get(key)
        .map_err(|_| Error::ImageError(format!("Image has no /{}", name)))?;
    resolve(document, value)?
        .as_i64()
        .map_err(|e| Error::ImageError(format!("Invalid /{}: {}", name, e)))
}

fn filter_names(document: &Document, dict: &Dictionary) -> Vec<String> {
    let name = |o: &Object| {
        resolve(document, o)
            .ok()
            .and_then(|o| o.as_name().ok())
            .map(|n| String::from_utf8_lossy(n).to_string())
    };
    match dict.get(b"Filter").ok().and_then(|f| resolve(document, f).ok()) {
        Some(Object::Array(array)) => array.iter().filter_map(name).collect(),
        Some(other) => name(other).into_iter().collect(),
        None => Vec::new(),
    }
}

/// Keep exactly `pixels * components` samples.
fn take_samples(mut samples: Vec<u8>, pixels: usize, components: usize) -> Result<Vec<u8>> {
    let needed = pixels
        .checked_mul(components)
        .ok_or_else(|| Error::ImageError("Image too large".to_string()))?;
    if samples.len() < needed {
        return Err(Error::ImageError(format!(
            "Expected {} sample bytes, found {}",
            needed,
            samples.len()
        )));
    }
    samples.truncate(needed);
    Ok(samples)
}

fn expand_palette(indices: &[u8], components: usize, palette: &[u8]) -> Result<Vec<u8>> {
    let mut colors = Vec::with_capacity(indices.len() * components);
    for &index in indices {
        let start = usize::from(index) * components;
        let entry = palette.get(start..start + components).ok_or_else(|| {
            Error::ImageError(format!("Palette index {} out of range", index))
        })?;
        colors.extend_from_slice(entry);
    }
    Ok(colors)
}

/// Convert CMYK bytes to RGB.
fn cmyk_to_rgb(cmyk: &[u8]) -> Vec<u8> {
    let mut rgb = Vec::with_capacity((cmyk.len() / 4) * 3);
    for chunk in cmyk.chunks_exact(4) {
        let k = 255 - u16::from(chunk[3]);
        for &channel in &chunk[..3] {
            rgb.push(((255 - u16::from(channel)) * k / 255) as u8);
        }
    }
    rgb
}
