use image::{DynamicImage, GrayImage, ImageFormat, RgbImage};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use std::fs;
use std::io::{self, Cursor};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Resource inheritance is followed at most this many `Parent` hops.
const MAX_PARENT_DEPTH: usize = 32;

/// Upper bound on decoded components per image (256 MiB of samples).
const MAX_IMAGE_SAMPLES: usize = 1 << 28;

/// A raster image recovered from a page, re-encoded as PNG.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedImage {
    /// 1-indexed page number.
    pub page: u32,
    /// 1-indexed position in the page's image list, counting skipped images.
    pub index: usize,
    pub width: u32,
    pub height: u32,
    pub data: ImageData,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ImageData {
    /// Encoded PNG kept in memory.
    Png(Vec<u8>),
    /// PNG written to the output directory.
    File(PathBuf),
}

#[derive(Debug, thiserror::Error)]
pub enum ImageError {
    #[error("malformed pdf object: {0}")]
    Pdf(#[from] lopdf::Error),
    #[error("image codec error: {0}")]
    Codec(#[from] image::ImageError),
    #[error("cannot write '{}': {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("image on page {page} has truncated or malformed sample data")]
    Samples { page: u32 },
}

/// Decode every supported raster image on every page.
///
/// Images whose colour model has four or more channels are skipped, as are
/// encodings other than raw, Flate and DCT samples. With an `output_dir`
/// each image is written as `page_{n}_img_{k}.png` and only its path is kept.
pub(crate) fn extract_images(
    pdf: &Document,
    output_dir: Option<&Path>,
) -> Result<Vec<ExtractedImage>, ImageError> {
    if let Some(dir) = output_dir {
        fs::create_dir_all(dir).map_err(|source| ImageError::Write {
            path: dir.to_path_buf(),
            source,
        })?;
    }

    let mut extracted = Vec::new();
    for (page, page_id) in pdf.get_pages() {
        for (position, stream) in page_images(pdf, page_id)?.into_iter().enumerate() {
            let index = position + 1;
            let Some(image) = decode_image(pdf, stream, page)? else {
                continue;
            };
            let (width, height) = (image.width(), image.height());
            let png = encode_png(&image)?;
            drop(image);

            let data = match output_dir {
                Some(dir) => {
                    let path = dir.join(format!("page_{page}_img_{index}.png"));
                    fs::write(&path, &png).map_err(|source| ImageError::Write {
                        path: path.clone(),
                        source,
                    })?;
                    ImageData::File(path)
                }
                None => ImageData::Png(png),
            };

            extracted.push(ExtractedImage {
                page,
                index,
                width,
                height,
                data,
            });
        }
    }

    Ok(extracted)
}

/// Number of image XObjects referenced by page resources, decodable or not.
pub(crate) fn count_images(pdf: &Document) -> Result<usize, lopdf::Error> {
    pdf.get_pages()
        .into_values()
        .map(|page_id| page_images(pdf, page_id).map(|images| images.len()))
        .sum()
}

fn resolve<'a>(pdf: &'a Document, object: &'a Object) -> Result<&'a Object, lopdf::Error> {
    match object {
        Object::Reference(id) => pdf.get_object(*id),
        other => Ok(other),
    }
}

/// The page's own `Resources`, or the nearest inherited one.
fn page_resources(pdf: &Document, page_id: ObjectId) -> Result<Option<&Dictionary>, lopdf::Error> {
    let mut node = pdf.get_dictionary(page_id)?;
    for _ in 0..MAX_PARENT_DEPTH {
        if let Ok(resources) = node.get(b"Resources") {
            return resolve(pdf, resources)?.as_dict().map(Some);
        }
        match node.get(b"Parent") {
            Ok(Object::Reference(parent)) => node = pdf.get_dictionary(*parent)?,
            _ => return Ok(None),
        }
    }
    Ok(None)
}

fn page_images(pdf: &Document, page_id: ObjectId) -> Result<Vec<&Stream>, lopdf::Error> {
    let Some(resources) = page_resources(pdf, page_id)? else {
        return Ok(Vec::new());
    };
    let Ok(xobjects) = resources.get(b"XObject") else {
        return Ok(Vec::new());
    };

    let mut images = Vec::new();
    for (_, entry) in resolve(pdf, xobjects)?.as_dict()?.iter() {
        if let Ok(stream) = resolve(pdf, entry)?.as_stream() {
            let subtype = stream.dict.get(b"Subtype").and_then(Object::as_name);
            if subtype.is_ok_and(|name| name == b"Image") {
                images.push(stream);
            }
        }
    }
    Ok(images)
}

enum ColourModel {
    Gray,
    Rgb,
    Indexed { base: usize, palette: Vec<u8> },
    Other { channels: usize },
}

impl ColourModel {
    fn channels(&self) -> usize {
        match self {
            Self::Gray => 1,
            Self::Rgb => 3,
            Self::Indexed { base, .. } => *base,
            Self::Other { channels } => *channels,
        }
    }
}

fn named_model(name: &[u8]) -> ColourModel {
    match name {
        b"DeviceGray" | b"CalGray" | b"G" => ColourModel::Gray,
        b"DeviceRGB" | b"CalRGB" | b"RGB" => ColourModel::Rgb,
        b"DeviceCMYK" | b"CMYK" => ColourModel::Other { channels: 4 },
        b"Lab" => ColourModel::Other { channels: 3 },
        _ => ColourModel::Other { channels: 0 },
    }
}

fn colour_model(pdf: &Document, object: &Object) -> Result<ColourModel, lopdf::Error> {
    let items = match resolve(pdf, object)? {
        Object::Name(name) => return Ok(named_model(name)),
        Object::Array(items) => items,
        _ => return Ok(ColourModel::Other { channels: 0 }),
    };
    let Some(family) = items.first() else {
        return Ok(ColourModel::Other { channels: 0 });
    };

    let model = match (resolve(pdf, family)?.as_name()?, items.get(1)) {
        (b"ICCBased", Some(profile)) => {
            let profile = resolve(pdf, profile)?.as_stream()?;
            match profile.dict.get(b"N")?.as_i64()? {
                1 => ColourModel::Gray,
                3 => ColourModel::Rgb,
                n => ColourModel::Other {
                    channels: usize::try_from(n).unwrap_or(0),
                },
            }
        }
        (b"Indexed" | b"I", Some(base)) => match colour_model(pdf, base)? {
            base @ (ColourModel::Gray | ColourModel::Rgb) => {
                let lookup = items.get(3).map(|lookup| resolve(pdf, lookup)).transpose()?;
                let palette = match lookup {
                    Some(Object::String(bytes, _)) => bytes.clone(),
                    Some(Object::Stream(stream)) => stream_bytes(stream)?,
                    _ => Vec::new(),
                };
                ColourModel::Indexed {
                    base: base.channels(),
                    palette,
                }
            }
            other => ColourModel::Other {
                channels: other.channels(),
            },
        },
        (b"DeviceN", Some(names)) => ColourModel::Other {
            channels: resolve(pdf, names)?.as_array()?.len(),
        },
        (b"Separation", _) => ColourModel::Other { channels: 1 },
        (b"ICCBased" | b"Indexed" | b"I" | b"DeviceN", None) => ColourModel::Other { channels: 0 },
        (name, _) => named_model(name),
    };
    Ok(model)
}

fn stream_bytes(stream: &Stream) -> Result<Vec<u8>, lopdf::Error> {
    if stream.dict.has(b"Filter") {
        stream.decompressed_content()
    } else {
        Ok(stream.content.clone())
    }
}

fn filter_names(stream: &Stream) -> Vec<&[u8]> {
    match stream.dict.get(b"Filter") {
        Ok(Object::Name(name)) => vec![name.as_slice()],
        Ok(Object::Array(items)) => items.iter().filter_map(|item| item.as_name().ok()).collect(),
        _ => Vec::new(),
    }
}

fn dimension(dict: &Dictionary, key: &[u8], page: u32) -> Result<u32, ImageError> {
    let value = dict.get(key)?.as_i64()?;
    u32::try_from(value)
        .ok()
        .filter(|value| *value > 0)
        .ok_or(ImageError::Samples { page })
}

fn decode_image(
    pdf: &Document,
    stream: &Stream,
    page: u32,
) -> Result<Option<DynamicImage>, ImageError> {
    let dict = &stream.dict;
    let is_mask = dict
        .get(b"ImageMask")
        .and_then(Object::as_bool)
        .unwrap_or(false);
    let model = match dict.get(b"ColorSpace") {
        Ok(space) => colour_model(pdf, space)?,
        Err(_) if is_mask => ColourModel::Gray,
        Err(_) => ColourModel::Other { channels: 0 },
    };

    let channels = model.channels();
    if channels >= 4 {
        debug!(page, channels, "skipping image with unsupported colour model");
        return Ok(None);
    }

    match filter_names(stream).as_slice() {
        [] => from_samples(dict, model, &stream.content, page),
        [filter] if *filter == b"FlateDecode" => {
            from_samples(dict, model, &stream.decompressed_content()?, page)
        }
        [filter] if *filter == b"DCTDecode" => Ok(Some(image::load_from_memory_with_format(
            &stream.content,
            ImageFormat::Jpeg,
        )?)),
        filters => {
            debug!(page, filters = filters.len(), "skipping image with unsupported encoding");
            Ok(None)
        }
    }
}

fn from_samples(
    dict: &Dictionary,
    model: ColourModel,
    data: &[u8],
    page: u32,
) -> Result<Option<DynamicImage>, ImageError> {
    let width = dimension(dict, b"Width", page)?;
    let height = dimension(dict, b"Height", page)?;
    let bits = dict
        .get(b"BitsPerComponent")
        .and_then(Object::as_i64)
        .ok()
        .and_then(|bits| u32::try_from(bits).ok())
        .unwrap_or(8);
    let malformed = || ImageError::Samples { page };

    let image = match model {
        ColourModel::Gray => {
            let pixels = unpack_samples(data, width, height, 1, bits, true).ok_or_else(malformed)?;
            GrayImage::from_raw(width, height, pixels).map(DynamicImage::ImageLuma8)
        }
        ColourModel::Rgb => {
            let pixels = unpack_samples(data, width, height, 3, bits, true).ok_or_else(malformed)?;
            RgbImage::from_raw(width, height, pixels).map(DynamicImage::ImageRgb8)
        }
        ColourModel::Indexed { base, palette } => {
            let indices =
                unpack_samples(data, width, height, 1, bits, false).ok_or_else(malformed)?;
            let pixels = expand_palette(&indices, &palette, base);
            if base == 1 {
                GrayImage::from_raw(width, height, pixels).map(DynamicImage::ImageLuma8)
            } else {
                RgbImage::from_raw(width, height, pixels).map(DynamicImage::ImageRgb8)
            }
        }
        ColourModel::Other { channels } => {
            debug!(page, channels, "skipping image with unsupported colour model");
            return Ok(None);
        }
    };

    image.map(Some).ok_or_else(malformed)
}

fn expand_palette(indices: &[u8], palette: &[u8], base: usize) -> Vec<u8> {
    const BLACK: [u8; 3] = [0; 3];
    indices
        .iter()
        .flat_map(|&index| {
            let start = usize::from(index) * base;
            palette
                .get(start..start + base)
                .unwrap_or(&BLACK[..base])
                .iter()
                .copied()
        })
        .collect()
}

/// Unpack rows of `bits`-per-component samples into one byte per component.
///
/// Rows are padded to whole bytes. With `scale` set, sub-byte samples are
/// stretched to 0..=255; otherwise they are returned raw (palette indices).
/// 16-bit samples keep their high byte.
fn unpack_samples(
    data: &[u8],
    width: u32,
    height: u32,
    components: usize,
    bits: u32,
    scale: bool,
) -> Option<Vec<u8>> {
    if width == 0 || height == 0 || !matches!(bits, 1 | 2 | 4 | 8 | 16) {
        return None;
    }
    let rows = usize::try_from(height).ok()?;
    let per_row = usize::try_from(width).ok()?.checked_mul(components)?;
    let samples = per_row.checked_mul(rows)?;
    if samples > MAX_IMAGE_SAMPLES {
        return None;
    }
    let row_bytes = per_row.checked_mul(bits as usize)?.div_ceil(8);
    if data.len() < row_bytes.checked_mul(rows)? {
        return None;
    }

    let mut out = Vec::with_capacity(samples);
    for row in data.chunks_exact(row_bytes).take(rows) {
        match bits {
            8 => out.extend_from_slice(&row[..per_row]),
            16 => out.extend(row.chunks_exact(2).map(|pair| pair[0])),
            1 | 2 | 4 => {
                let max = (1u16 << bits) - 1;
                let step = bits as usize;
                for sample in 0..per_row {
                    let bit = sample * step;
                    let shift = 8 - step - bit % 8;
                    let value = u16::from(row[bit / 8] >> shift) & max;
                    let value = if scale { value * 255 / max } else { value };
                    out.push(value as u8);
                }
            }
            _ => return None,
        }
    }
    Some(out)
}

fn encode_png(image: &DynamicImage) -> Result<Vec<u8>, image::ImageError> {
    let mut cursor = Cursor::new(Vec::new());
    image.write_to(&mut cursor, ImageFormat::Png)?;
    Ok(cursor.into_inner())
}
