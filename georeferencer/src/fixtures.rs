//! Small synthetic photographs for stage tests.

use std::path::Path;

use gdal::raster::Buffer;
use gdal::DriverManager;

use crate::ground_control::GeoreferenceResult;

/// Writes a single band 8-bit JPEG of `width` x `height` whose pixel values
/// come from `pixel(x, y)`.
pub fn write_raw_jpeg<F>(path: &Path, width: usize, height: usize, pixel: F) -> GeoreferenceResult<()>
where
    F: Fn(usize, usize) -> u8,
{
    let pixel = &pixel;
    let data: Vec<u8> = (0..height)
        .flat_map(|y| (0..width).map(move |x| pixel(x, y)))
        .collect();

    let mem = DriverManager::get_driver_by_name("MEM")?;
    let dataset = mem.create_with_band_type::<u8, _>("", width as isize, height as isize, 1)?;
    let mut band = dataset.rasterband(1)?;
    band.write(
        (0, 0),
        (width, height),
        &Buffer {
            size: (width, height),
            data,
        },
    )?;

    let jpeg = DriverManager::get_driver_by_name("JPEG")?;
    dataset.create_copy(&jpeg, path, &[])?;
    Ok(())
}
