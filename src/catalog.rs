use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BirdRecord {
    pub name: String,
    pub description: String,
}

impl BirdRecord {
    pub fn new(name: &str, description: &str) -> Self {
        Self {
            name: name.to_owned(),
            description: description.to_owned(),
        }
    }
}

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("A bird catalog needs at least one bird")]
    Empty,
}

/// Fixed list of birds built once at startup. Read-only afterwards so it can
/// be shared between requests without any locking.
#[derive(Debug, Clone)]
pub struct BirdCatalog {
    birds: Vec<BirdRecord>,
}

impl BirdCatalog {
    pub fn new(birds: Vec<BirdRecord>) -> Result<Self, CatalogError> {
        if birds.is_empty() {
            return Err(CatalogError::Empty);
        }
        Ok(Self { birds })
    }

    /// Uniform pick using the calling thread's generator
    pub fn pick(&self) -> &BirdRecord {
        self.pick_with(&mut rand::thread_rng())
    }

    pub fn pick_with<R: Rng + ?Sized>(&self, rng: &mut R) -> &BirdRecord {
        // non-empty is guaranteed by the constructor
        &self.birds[rng.gen_range(0..self.birds.len())]
    }

    pub fn len(&self) -> usize {
        self.birds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.birds.is_empty()
    }

    pub fn birds(&self) -> &[BirdRecord] {
        &self.birds
    }
}

const BUILTIN_BIRDS: &[(&str, &str)] = &[
    (
        "Bald Eagle",
        "A large bird of prey found in North America, recognizable by its white head and tail against a dark brown body.",
    ),
    (
        "Peregrine Falcon",
        "The fastest animal on the planet, reaching speeds over 300 km/h when diving after prey.",
    ),
    (
        "Atlantic Puffin",
        "A seabird with a brightly colored beak that nests in burrows on North Atlantic cliffs and can carry a dozen fish at once.",
    ),
    (
        "Snowy Owl",
        "A white owl of the Arctic tundra that, unlike most owls, hunts during the day.",
    ),
    (
        "Ruby-throated Hummingbird",
        "A tiny hummingbird that beats its wings around 50 times a second and migrates nonstop across the Gulf of Mexico.",
    ),
    (
        "Emperor Penguin",
        "The tallest and heaviest penguin, breeding through the Antarctic winter with the male keeping the egg warm on his feet.",
    ),
    (
        "Northern Cardinal",
        "A songbird whose males are bright red; both sexes sing, and pairs often sing back and forth to each other.",
    ),
    (
        "Blue Jay",
        "A loud, intelligent corvid of eastern North America known for mimicking the calls of hawks.",
    ),
    (
        "Common Kingfisher",
        "A small, vividly blue bird that dives headfirst into rivers to catch fish.",
    ),
    (
        "Barn Swallow",
        "The most widespread swallow in the world, building cup-shaped mud nests under eaves and bridges.",
    ),
    (
        "Greater Flamingo",
        "A wading bird that gets its pink color from pigments in the algae and shrimp it eats.",
    ),
    (
        "Shoebill",
        "A tall African wetland bird with an enormous shoe-shaped bill, known for standing motionless for hours.",
    ),
    (
        "Kea",
        "An alpine parrot from New Zealand famous for its curiosity and for taking apart cars and backpacks.",
    ),
    (
        "Wandering Albatross",
        "The bird with the largest wingspan alive, able to glide for hours over the Southern Ocean without flapping.",
    ),
    (
        "Common Raven",
        "A large black corvid that solves puzzles, uses tools and can imitate human speech.",
    ),
    (
        "Superb Lyrebird",
        "An Australian ground bird that can mimic almost any sound it hears, from other birds to camera shutters.",
    ),
    (
        "Arctic Tern",
        "A seabird with the longest migration of any animal, flying from the Arctic to the Antarctic and back every year.",
    ),
    (
        "Great Horned Owl",
        "A powerful owl with ear tufts that hunts prey as large as skunks and geese.",
    ),
    (
        "American Robin",
        "A thrush with an orange breast whose morning song is one of the first heard in spring.",
    ),
    (
        "Indian Peafowl",
        "A pheasant whose males display a huge fan of iridescent tail feathers decorated with eyespots.",
    ),
];

impl Default for BirdCatalog {
    fn default() -> Self {
        Self {
            birds: BUILTIN_BIRDS
                .iter()
                .map(|(name, description)| BirdRecord::new(name, description))
                .collect(),
        }
    }
}
