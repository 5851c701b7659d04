//! `Cell` and the morphology it builds up into.

/// Maximum cells a single organism's body may carry.
pub const MAX_CELLS: usize = 16;

/// One body segment at a fixed grid offset from the organism's center.
/// Capability weights are independent dials; a cell can carry more than one
/// (e.g. armored and photosynthetic at once).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Cell {
    pub offset: (i8, i8),
    pub alive: bool,
    pub sensor: f32,
    pub actuator: f32,
    pub mouth: f32,
    pub digestive: f32,
    pub photosynthetic: f32,
    pub storage: f32,
    pub armor: f32,
    pub reproductive: f32,
    pub bioluminescent: f32,
    pub age_ticks: u32,
    pub decomposition_ticks: u16,
}

impl Cell {
    pub fn new(offset: (i8, i8)) -> Self {
        Self {
            offset,
            alive: true,
            sensor: 0.0,
            actuator: 0.0,
            mouth: 0.0,
            digestive: 0.0,
            photosynthetic: 0.0,
            storage: 0.0,
            armor: 0.0,
            reproductive: 0.0,
            bioluminescent: 0.0,
            age_ticks: 0,
            decomposition_ticks: 0,
        }
    }
}

/// Fixed-capacity cell sequence (`≤ MAX_CELLS`), ordered as grown.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CellVec {
    cells: Vec<Cell>,
}

impl CellVec {
    pub fn new() -> Self {
        Self { cells: Vec::new() }
    }

    pub fn capacity_remaining(&self) -> usize {
        MAX_CELLS.saturating_sub(self.cells.len())
    }

    /// Appends `cell`, returning `false` without mutating if already at
    /// `MAX_CELLS`; the caller may skip the cell rather than treat this as
    /// an error.
    pub fn push(&mut self, cell: Cell) -> bool {
        if self.cells.len() >= MAX_CELLS {
            return false;
        }
        self.cells.push(cell);
        true
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn alive_count(&self) -> usize {
        self.cells.iter().filter(|c| c.alive).count()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Cell> {
        self.cells.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Cell> {
        self.cells.iter_mut()
    }

    pub fn as_slice(&self) -> &[Cell] {
        &self.cells
    }
}

impl FromIterator<Cell> for CellVec {
    fn from_iter<T: IntoIterator<Item = Cell>>(iter: T) -> Self {
        let mut out = CellVec::new();
        for cell in iter.into_iter().take(MAX_CELLS) {
            out.push(cell);
        }
        out
    }
}

/// Aggregate morphology derived from a `CellVec`: the quantities every other
/// module (vision, feeding, energy, physics) actually consumes.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Capabilities {
    pub photo_weight: f32,
    pub actuator_weight: f32,
    pub structural_armor: f32,
    pub mouth_size: f32,
    /// 0 = pure herbivore, 1 = pure carnivore.
    pub digestive_spectrum: f32,
    /// 0 = plant-like, 1 = animal-like.
    pub composition: f32,
    pub storage_capacity: f32,
    pub sensor_weight: f32,
    pub reproductive_weight: f32,
    pub bioluminescent_weight: f32,
}

impl Capabilities {
    pub fn from_cells(cells: &CellVec) -> Self {
        let alive: Vec<&Cell> = cells.iter().filter(|c| c.alive).collect();
        if alive.is_empty() {
            return Self::default();
        }
        let n = alive.len() as f32;
        let sum = |f: fn(&Cell) -> f32| alive.iter().map(|c| f(**c)).sum::<f32>();

        let photo = sum(|c| c.photosynthetic);
        let armor = sum(|c| c.armor);
        let mouth = sum(|c| c.mouth);
        let digestive = sum(|c| c.digestive) / n;
        let storage = sum(|c| c.storage);
        let sensor = sum(|c| c.sensor);
        let reproductive = sum(|c| c.reproductive);
        let glow = sum(|c| c.bioluminescent);
        let actuator = sum(|c| c.actuator);

        // Composition leans animal-like as actuator/mouth/armor investment
        // grows relative to photosynthetic/storage investment.
        let animal_mass = actuator + mouth + armor;
        let plant_mass = photo + storage;
        let composition = if animal_mass + plant_mass > 0.0 {
            animal_mass / (animal_mass + plant_mass)
        } else {
            0.5
        };

        Self {
            photo_weight: photo,
            actuator_weight: actuator,
            structural_armor: armor,
            mouth_size: mouth,
            digestive_spectrum: digestive.clamp(0.0, 1.0),
            composition: composition.clamp(0.0, 1.0),
            storage_capacity: storage,
            sensor_weight: sensor,
            reproductive_weight: reproductive,
            bioluminescent_weight: glow,
        }
    }

    pub fn has_breeding_trait(&self) -> bool {
        self.reproductive_weight > 0.0
    }
}

/// Oriented bounding box in world space, derived from cell offsets and
/// rotated with heading.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Obb {
    pub center: (f32, f32),
    pub half_extents: (f32, f32),
    pub rotation: f32,
}

impl Obb {
    pub fn from_cells(cells: &CellVec, center: (f32, f32), heading: f32) -> Self {
        let (mut min_x, mut min_y, mut max_x, mut max_y) = (0.0f32, 0.0f32, 0.0f32, 0.0f32);
        for cell in cells.iter().filter(|c| c.alive) {
            let (gx, gy) = (cell.offset.0 as f32, cell.offset.1 as f32);
            min_x = min_x.min(gx);
            min_y = min_y.min(gy);
            max_x = max_x.max(gx);
            max_y = max_y.max(gy);
        }
        let half_extents = (((max_x - min_x).max(1.0)) * 0.5, ((max_y - min_y).max(1.0)) * 0.5);
        Self {
            center,
            half_extents,
            rotation: heading,
        }
    }
}
