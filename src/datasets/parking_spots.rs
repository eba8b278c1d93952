//! Parking spot monitoring table.

use crate::config::TableConfig;
use crate::datasets::build_pipeline;
use crate::pipeline::{CellValue, Column, PipelineResult, RowModelPipeline, ValueKind};
use crate::types::ParkingSpot;

pub const ID: &str = "id";
pub const LATITUDE: &str = "latitude";
pub const LONGITUDE: &str = "longitude";
pub const ZONE: &str = "parkingSpotZone";
pub const OCCUPIED: &str = "occupied";
pub const OCCUPIED_TIMESTAMP: &str = "occupiedTimestamp";

fn occupied_label(occupied: bool) -> &'static str {
    if occupied {
        "Yes"
    } else {
        "No"
    }
}

pub fn columns() -> Vec<Column<ParkingSpot>> {
    vec![
        Column::new(ID, "ID")
            .accessor(|s: &ParkingSpot| CellValue::from(s.id.as_str()))
            .kind(ValueKind::Text)
            .sortable()
            .filterable(),
        Column::new(LATITUDE, "Lat")
            .accessor(|s: &ParkingSpot| CellValue::Number(s.latitude))
            .kind(ValueKind::Number)
            .sortable()
            .filterable(),
        Column::new(LONGITUDE, "Long")
            .accessor(|s: &ParkingSpot| CellValue::Number(s.longitude))
            .kind(ValueKind::Number)
            .sortable()
            .filterable(),
        // Missing zones display as "/" and sort last.
        Column::new(ZONE, "Zone")
            .accessor(|s: &ParkingSpot| CellValue::from(s.zone()))
            .kind(ValueKind::Text)
            .sortable()
            .filterable(),
        Column::new(OCCUPIED, "Occupied")
            .accessor(|s: &ParkingSpot| CellValue::from(occupied_label(s.occupied)))
            .kind(ValueKind::Text)
            .sortable()
            .filterable(),
        Column::new(OCCUPIED_TIMESTAMP, "Occupied Timestamp")
            .accessor(|s: &ParkingSpot| CellValue::from(s.occupied_timestamp))
            .kind(ValueKind::Date)
            .sortable()
            .filterable(),
    ]
}

pub fn pipeline(config: &TableConfig) -> PipelineResult<RowModelPipeline<ParkingSpot>> {
    build_pipeline(columns(), config)
}
