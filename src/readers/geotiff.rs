use super::{DataReader, GeoTransform, Grid, ReadError};
use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::PathBuf;
use tiff::decoder::{Decoder, DecodingResult};
use tiff::tags::Tag;

const MODEL_PIXEL_SCALE: u16 = 33550;
const MODEL_TIEPOINT: u16 = 33922;
const MODEL_TRANSFORMATION: u16 = 34264;
const GDAL_NODATA: u16 = 42113;

pub struct GeoTiffReader {
    pub file_name: PathBuf,
}

impl DataReader for GeoTiffReader {
    fn read_data(&self) -> Result<Grid, ReadError> {
        let file = File::open(&self.file_name)
            .map_err(|e| ReadError::GeoTiff(format!("Failed to open file: {}", e)))?;

        let reader = BufReader::new(file);

        let mut decoder = Decoder::new(reader)
            .map_err(|e| ReadError::GeoTiff(format!("Failed to decode TIFF: {}", e)))?;

        let (width, height) = decoder
            .dimensions()
            .map_err(|e| ReadError::GeoTiff(format!("Failed to get dimensions: {}", e)))?;
        let (width, height) = (width as usize, height as usize);

        let transform = read_transform(&mut decoder)?;
        let nodata = read_nodata(&mut decoder);

        let image_data: Vec<f32> = match decoder
            .read_image()
            .map_err(|e| ReadError::GeoTiff(format!("Failed to read image: {}", e)))?
        {
            DecodingResult::U8(data) => data.iter().map(|&x| x as f32).collect(),
            DecodingResult::U16(data) => data.iter().map(|&x| x as f32).collect(),
            DecodingResult::U32(data) => data.iter().map(|&x| x as f32).collect(),
            DecodingResult::I8(data) => data.iter().map(|&x| x as f32).collect(),
            DecodingResult::I16(data) => data.iter().map(|&x| x as f32).collect(),
            DecodingResult::I32(data) => data.iter().map(|&x| x as f32).collect(),
            DecodingResult::F32(data) => data,
            DecodingResult::F64(data) => data.iter().map(|&x| x as f32).collect(),
            _ => return Err(ReadError::GeoTiff("Unsupported pixel format".to_string())),
        };

        let buffer = first_band(image_data, width * height)?;

        Ok(Grid {
            width,
            height,
            transform,
            nodata,
            buffer,
        })
    }
}

/// Keeps band 1 of pixel-interleaved data.
fn first_band(data: Vec<f32>, pixels: usize) -> Result<Vec<f32>, ReadError> {
    if pixels == 0 || data.len() % pixels != 0 {
        return Err(ReadError::GeoTiff(format!(
            "Image holds {} samples, not a multiple of {} pixels",
            data.len(),
            pixels
        )));
    }

    let samples = data.len() / pixels;
    if samples == 1 {
        return Ok(data);
    }

    Ok(data.into_iter().step_by(samples).collect())
}

fn read_transform<R: Read + Seek>(decoder: &mut Decoder<R>) -> Result<GeoTransform, ReadError> {
    if let Ok(m) = decoder.get_tag_f64_vec(Tag::from_u16_exhaustive(MODEL_TRANSFORMATION))
        && m.len() >= 8
    {
        return Ok(GeoTransform([m[3], m[0], m[1], m[7], m[4], m[5]]));
    }

    let scale = decoder
        .get_tag_f64_vec(Tag::from_u16_exhaustive(MODEL_PIXEL_SCALE))
        .map_err(|e| ReadError::GeoTiff(format!("Missing ModelPixelScale tag: {}", e)))?;
    let tiepoint = decoder
        .get_tag_f64_vec(Tag::from_u16_exhaustive(MODEL_TIEPOINT))
        .map_err(|e| ReadError::GeoTiff(format!("Missing ModelTiepoint tag: {}", e)))?;

    if scale.len() < 2 || tiepoint.len() < 6 {
        return Err(ReadError::GeoTiff(
            "Malformed georeferencing tags".to_string(),
        ));
    }

    // Tiepoint is (i, j, k, x, y, z): raster (i, j) sits at world (x, y)
    let (sx, sy) = (scale[0], scale[1]);
    let (i, j, x, y) = (tiepoint[0], tiepoint[1], tiepoint[3], tiepoint[4]);

    Ok(GeoTransform::north_up(x - i * sx, y + j * sy, sx, sy))
}

fn read_nodata<R: Read + Seek>(decoder: &mut Decoder<R>) -> Option<f64> {
    decoder
        .get_tag_ascii_string(Tag::from_u16_exhaustive(GDAL_NODATA))
        .ok()
        .and_then(|s| s.trim_matches(char::from(0)).trim().parse::<f64>().ok())
}
