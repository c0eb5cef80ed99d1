//! Room Geometry
//!
//! A rectangular room with a wall margin, a few solid obstacles, and the
//! player. Coordinates are integer room units with the origin top-left.

use serde::{Deserialize, Serialize};

use crate::npc::{NpcId, NpcRoster};

/// Room width
pub const ROOM_WIDTH: i32 = 900;
/// Room height
pub const ROOM_HEIGHT: i32 = 600;
/// Distance the player must keep from every wall
pub const WALL_MARGIN: i32 = 50;
/// Player footprint width
pub const PLAYER_WIDTH: i32 = 50;
/// Player footprint height
pub const PLAYER_HEIGHT: i32 = 60;
/// Units moved per move intent
pub const PLAYER_SPEED: i32 = 5;
/// An NPC can be talked to below this distance
pub const INTERACT_DISTANCE: f64 = 40.0;
/// NPC name labels appear below this distance
pub const LABEL_DISTANCE: f64 = 60.0;

/// A point in room units
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    /// Horizontal, grows rightwards
    pub x: i32,
    /// Vertical, grows downwards
    pub y: i32,
}

impl Position {
    /// Create a position
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Euclidean distance
    #[must_use]
    pub fn distance_to(self, other: Self) -> f64 {
        let dx = f64::from(self.x - other.x);
        let dy = f64::from(self.y - other.y);
        dx.hypot(dy)
    }
}

/// Axis-aligned rectangle
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rect {
    /// Left edge
    pub x: i32,
    /// Top edge
    pub y: i32,
    /// Width
    pub width: i32,
    /// Height
    pub height: i32,
}

impl Rect {
    /// Create a rectangle
    #[must_use]
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Whether the interiors overlap (touching edges do not count)
    #[must_use]
    pub fn intersects(&self, other: &Rect) -> bool {
        self.x < other.x + other.width
            && other.x < self.x + self.width
            && self.y < other.y + other.height
            && other.y < self.y + self.height
    }
}

/// Which way the player last moved
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Facing {
    /// Towards the top wall
    Up,
    /// Towards the bottom wall
    #[default]
    Down,
    /// Towards the left wall
    Left,
    /// Towards the right wall
    Right,
}

impl Facing {
    /// Facing for a move intent; horizontal wins ties
    fn from_intent(dx: i32, dy: i32) -> Option<Self> {
        if dx > 0 {
            Some(Self::Right)
        } else if dx < 0 {
            Some(Self::Left)
        } else if dy > 0 {
            Some(Self::Down)
        } else if dy < 0 {
            Some(Self::Up)
        } else {
            None
        }
    }
}

/// The player character
#[derive(Clone, Debug)]
pub struct Player {
    /// Top-left corner
    pub position: Position,
    /// Last movement direction
    pub facing: Facing,
}

impl Player {
    /// Footprint at a candidate position
    fn footprint_at(position: Position) -> Rect {
        Rect::new(position.x, position.y, PLAYER_WIDTH, PLAYER_HEIGHT)
    }

    /// Current footprint
    #[must_use]
    pub fn footprint(&self) -> Rect {
        Self::footprint_at(self.position)
    }
}

/// The room and everything that moves in it
#[derive(Clone, Debug)]
pub struct World {
    /// Solid furniture
    obstacles: Vec<Rect>,
    /// The player
    player: Player,
}

impl Default for World {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl World {
    /// Create a room with the player standing in the centre
    #[must_use]
    pub fn new(obstacles: Vec<Rect>) -> Self {
        Self {
            obstacles,
            player: Player {
                position: Position::new(ROOM_WIDTH / 2, ROOM_HEIGHT / 2),
                facing: Facing::default(),
            },
        }
    }

    /// Place the player (tests and scripted starts)
    #[must_use]
    pub fn with_player_at(mut self, position: Position) -> Self {
        self.player.position = position;
        self
    }

    /// The player
    #[must_use]
    pub fn player(&self) -> &Player {
        &self.player
    }

    /// Solid furniture
    #[must_use]
    pub fn obstacles(&self) -> &[Rect] {
        &self.obstacles
    }

    fn x_in_bounds(x: i32) -> bool {
        (WALL_MARGIN..=ROOM_WIDTH - PLAYER_WIDTH - WALL_MARGIN).contains(&x)
    }

    fn y_in_bounds(y: i32) -> bool {
        (WALL_MARGIN..=ROOM_HEIGHT - PLAYER_HEIGHT - WALL_MARGIN).contains(&y)
    }

    fn collides(&self, position: Position) -> bool {
        let footprint = Player::footprint_at(position);
        self.obstacles.iter().any(|o| o.intersects(&footprint))
    }

    /// Apply one move intent (`dx`, `dy` in -1..=1).
    ///
    /// A move that would leave the room slides along the wall: each axis that
    /// stays in bounds (and clear of obstacles) is still applied. A move into
    /// an obstacle inside the room is refused outright.
    pub fn move_player(&mut self, dx: i32, dy: i32) {
        let Some(facing) = Facing::from_intent(dx, dy) else {
            return;
        };
        let current = self.player.position;
        let target = Position::new(current.x + dx * PLAYER_SPEED, current.y + dy * PLAYER_SPEED);

        if Self::x_in_bounds(target.x) && Self::y_in_bounds(target.y) {
            if !self.collides(target) {
                self.player.position = target;
                self.player.facing = facing;
            }
            return;
        }

        let mut slid = current;
        if Self::x_in_bounds(target.x) && !self.collides(Position::new(target.x, slid.y)) {
            slid.x = target.x;
        }
        if Self::y_in_bounds(target.y) && !self.collides(Position::new(slid.x, target.y)) {
            slid.y = target.y;
        }
        self.player.position = slid;
        self.player.facing = facing;
    }

    /// First NPC (in roster order) close enough to talk to
    #[must_use]
    pub fn interactable_npc(&self, roster: &NpcRoster) -> Option<NpcId> {
        roster
            .iter()
            .find(|npc| self.player.position.distance_to(npc.position) < INTERACT_DISTANCE)
            .map(|npc| npc.id)
    }

    /// Whether an NPC at `position` is close enough to show its label
    #[must_use]
    pub fn label_visible(&self, position: Position) -> bool {
        self.player.position.distance_to(position) < LABEL_DISTANCE
    }
}
