//! Path table and placement grid derived from a map definition.

use team_defence_core::{
    CellCoord, CellRect, Lane, LaneId, MapDefinition, MapError, PathRule, PlacementError,
};

/// Immutable playfield geometry.
#[derive(Debug)]
pub(crate) struct Playfield {
    columns: u32,
    rows: u32,
    tile_length: f32,
    lanes: Vec<Lane>,
    lane_lengths: Vec<f32>,
    path_rule: PathRule,
    blocked: Vec<bool>,
}

impl Playfield {
    pub(crate) fn new(map: MapDefinition, tile_length: f32) -> Result<Self, MapError> {
        if !(tile_length > 0.0) {
            return Err(MapError::InvalidTileLength);
        }
        if map.columns == 0 || map.rows == 0 {
            return Err(MapError::EmptyPlayfield);
        }
        if map.lanes.is_empty() {
            return Err(MapError::NoLanes);
        }
        if let Some(lane) = map.lanes.iter().position(|lane| lane.waypoints.len() < 2) {
            return Err(MapError::LaneTooShort { lane });
        }

        let mut playfield = Self {
            columns: map.columns,
            rows: map.rows,
            tile_length,
            lane_lengths: map.lanes.iter().map(Lane::length).collect(),
            lanes: map.lanes,
            path_rule: map.path_rule,
            blocked: vec![false; map.columns as usize * map.rows as usize],
        };

        for cell in map.blocked {
            let index = playfield
                .index(cell)
                .ok_or(MapError::BlockedCellOutOfBounds {
                    column: cell.column(),
                    row: cell.row(),
                })?;
            playfield.blocked[index] = true;
        }
        playfield.block_lane_tiles();

        Ok(playfield)
    }

    /// Marks every tile a lane passes through as unbuildable.
    fn block_lane_tiles(&mut self) {
        let step = self.tile_length / 4.0;
        let mut crossed = Vec::new();
        for lane in &self.lanes {
            for pair in lane.waypoints.windows(2) {
                let (from, to) = (pair[0], pair[1]);
                let samples = (from.distance(to) / step).ceil().max(1.0) as u32;
                for sample in 0..=samples {
                    let point = from.lerp(to, sample as f32 / samples as f32);
                    if let Some(cell) = CellCoord::containing(point, self.tile_length) {
                        crossed.push(cell);
                    }
                }
            }
        }
        for cell in crossed {
            if let Some(index) = self.index(cell) {
                self.blocked[index] = true;
            }
        }
    }

    fn index(&self, cell: CellCoord) -> Option<usize> {
        if cell.column() < self.columns && cell.row() < self.rows {
            Some(cell.row() as usize * self.columns as usize + cell.column() as usize)
        } else {
            None
        }
    }

    pub(crate) fn tile_length(&self) -> f32 {
        self.tile_length
    }

    pub(crate) fn width(&self) -> f32 {
        self.columns as f32 * self.tile_length
    }

    pub(crate) fn height(&self) -> f32 {
        self.rows as f32 * self.tile_length
    }

    pub(crate) fn lane(&self, lane: LaneId) -> Option<&Lane> {
        self.lanes.get(lane.index())
    }

    pub(crate) fn lane_length(&self, lane: LaneId) -> f32 {
        self.lane_lengths.get(lane.index()).copied().unwrap_or(0.0)
    }

    pub(crate) fn lane_count(&self) -> usize {
        self.lanes.len()
    }

    pub(crate) fn path_rule(&self) -> PathRule {
        self.path_rule
    }

    /// Checks that every tile of `region` is on the playfield and buildable.
    pub(crate) fn check_buildable(&self, region: &CellRect) -> Result<(), PlacementError> {
        for cell in region.cells() {
            let index = self.index(cell).ok_or(PlacementError::OutOfBounds)?;
            if self.blocked[index] {
                return Err(PlacementError::Blocked);
            }
        }
        Ok(())
    }
}
