use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::{Path, PathBuf};

use crate::image_processing::composite::PasteRegion;
use crate::label::NormalizedBox;

pub const TILE_MANIFEST_HEADER: [&str; 9] = [
    "tile_path",
    "col",
    "row",
    "x",
    "y",
    "w",
    "h",
    "page_width",
    "page_height",
];

pub const DATASET_MANIFEST_HEADER: [&str; 12] = [
    "spread",
    "src_tile",
    "out_image",
    "x",
    "y",
    "w",
    "h",
    "cx",
    "cy",
    "nw",
    "nh",
    "has_face",
];

/// Geometry of one tile within its padded page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileManifestRow {
    pub tile_path: String,
    pub col: u32,
    pub row: u32,
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
    pub page_width: u32,
    pub page_height: u32,
}

/// Outcome for one output tile; geometry fields are empty for background tiles
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetManifestRow {
    pub spread: String,
    pub src_tile: String,
    pub out_image: String,
    pub x: Option<u32>,
    pub y: Option<u32>,
    pub w: Option<u32>,
    pub h: Option<u32>,
    pub cx: Option<f64>,
    pub cy: Option<f64>,
    pub nw: Option<f64>,
    pub nh: Option<f64>,
    pub has_face: u8,
}

impl DatasetManifestRow {
    pub fn labeled(
        spread: &str,
        src_tile: &str,
        out_image: &str,
        region: &PasteRegion,
        bbox: &NormalizedBox,
    ) -> Self {
        Self {
            spread: spread.to_string(),
            src_tile: src_tile.to_string(),
            out_image: out_image.to_string(),
            x: Some(region.x),
            y: Some(region.y),
            w: Some(region.width),
            h: Some(region.height),
            cx: Some(bbox.cx),
            cy: Some(bbox.cy),
            nw: Some(bbox.width),
            nh: Some(bbox.height),
            has_face: 1,
        }
    }

    pub fn background(spread: &str, src_tile: &str, out_image: &str) -> Self {
        Self {
            spread: spread.to_string(),
            src_tile: src_tile.to_string(),
            out_image: out_image.to_string(),
            x: None,
            y: None,
            w: None,
            h: None,
            cx: None,
            cy: None,
            nw: None,
            nh: None,
            has_face: 0,
        }
    }

    pub fn has_face(&self) -> bool {
        self.has_face == 1
    }
}

/// CSV manifest that writes its header exactly once, then one record per row
pub struct ManifestWriter {
    path: PathBuf,
    writer: csv::Writer<File>,
}

impl ManifestWriter {
    pub fn create(path: &Path, header: &[&str]) -> Result<Self> {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_path(path)
            .with_context(|| format!("Failed to create manifest: {}", path.display()))?;
        writer
            .write_record(header)
            .with_context(|| format!("Failed to write manifest header: {}", path.display()))?;

        Ok(Self {
            path: path.to_path_buf(),
            writer,
        })
    }

    pub fn append<T: Serialize>(&mut self, row: &T) -> Result<()> {
        self.writer
            .serialize(row)
            .with_context(|| format!("Failed to write manifest row: {}", self.path.display()))
    }

    pub fn finish(mut self) -> Result<PathBuf> {
        self.writer
            .flush()
            .with_context(|| format!("Failed to flush manifest: {}", self.path.display()))?;
        Ok(self.path)
    }
}

/// Write a complete manifest in one go
pub fn write_manifest<T: Serialize>(path: &Path, header: &[&str], rows: &[T]) -> Result<PathBuf> {
    let mut writer = ManifestWriter::create(path, header)?;
    for row in rows {
        writer.append(row)?;
    }
    writer.finish()
}

/// Read every row of a manifest written by [`ManifestWriter`]
pub fn read_manifest<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("Failed to open manifest: {}", path.display()))?;

    reader
        .deserialize()
        .map(|row| row.with_context(|| format!("Malformed manifest row in {}", path.display())))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_tile_manifest_header_written_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("manifest.csv");
        let rows = vec![TileManifestRow {
            tile_path: "out/3/3_r000_c000.png".to_string(),
            col: 0,
            row: 0,
            x: 0,
            y: 0,
            w: 128,
            h: 128,
            page_width: 384,
            page_height: 256,
        }];

        write_manifest(&path, &TILE_MANIFEST_HEADER, &rows).unwrap();

        let contents = fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], "tile_path,col,row,x,y,w,h,page_width,page_height");
        assert_eq!(lines[1], "out/3/3_r000_c000.png,0,0,0,0,128,128,384,256");

        let back: Vec<TileManifestRow> = read_manifest(&path).unwrap();
        assert_eq!(back, rows);
    }

    #[test]
    fn test_background_row_has_empty_geometry() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("manifest.csv");
        let rows = vec![DatasetManifestRow::background("1", "1_r000_c000.png", "1__1_r000_c000.png")];

        write_manifest(&path, &DATASET_MANIFEST_HEADER, &rows).unwrap();

        let contents = fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = contents.lines().collect();
        assert_eq!(lines[0], "spread,src_tile,out_image,x,y,w,h,cx,cy,nw,nh,has_face");
        assert_eq!(lines[1], "1,1_r000_c000.png,1__1_r000_c000.png,,,,,,,,,0");

        let back: Vec<DatasetManifestRow> = read_manifest(&path).unwrap();
        assert_eq!(back, rows);
        assert!(!back[0].has_face());
    }

    #[test]
    fn test_labeled_row_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("manifest.csv");
        let region = PasteRegion {
            x: 5,
            y: 7,
            width: 40,
            height: 30,
        };
        let bbox = NormalizedBox::from_region(&region, 128);
        let rows = vec![DatasetManifestRow::labeled(
            "2",
            "2_r001_c003.png",
            "2__2_r001_c003.png",
            &region,
            &bbox,
        )];

        write_manifest(&path, &DATASET_MANIFEST_HEADER, &rows).unwrap();
        let back: Vec<DatasetManifestRow> = read_manifest(&path).unwrap();
        assert_eq!(back, rows);
        assert_eq!(back[0].w, Some(40));
        assert!(back[0].has_face());
    }

    #[test]
    fn test_empty_manifest_still_has_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("manifest.csv");
        write_manifest::<DatasetManifestRow>(&path, &DATASET_MANIFEST_HEADER, &[]).unwrap();

        let contents = fs::read_to_string(&path).unwrap();
        assert_eq!(contents.lines().count(), 1);
        let back: Vec<DatasetManifestRow> = read_manifest(&path).unwrap();
        assert!(back.is_empty());
    }
}
