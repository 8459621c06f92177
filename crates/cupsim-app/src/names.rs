// Seeded cosmetic data: nations, squads, venues and referees.

use rand::seq::SliceRandom;
use rand::Rng;

use cupsim_core::bracket::GROUP_LETTERS;
use cupsim_core::player::{Player, Position};
use cupsim_core::roster::RosterError;
use cupsim_core::team::Team;

/// Teams per group.
pub const GROUP_SIZE: usize = 4;

/// The 32 entrants with their confederation.
pub const NATIONS: [(&str, &str); 32] = [
    ("Argentina", "CONMEBOL"),
    ("Brazil", "CONMEBOL"),
    ("Uruguay", "CONMEBOL"),
    ("Colombia", "CONMEBOL"),
    ("Ecuador", "CONMEBOL"),
    ("France", "UEFA"),
    ("Germany", "UEFA"),
    ("Spain", "UEFA"),
    ("England", "UEFA"),
    ("Portugal", "UEFA"),
    ("Netherlands", "UEFA"),
    ("Belgium", "UEFA"),
    ("Croatia", "UEFA"),
    ("Italy", "UEFA"),
    ("Denmark", "UEFA"),
    ("Switzerland", "UEFA"),
    ("Serbia", "UEFA"),
    ("Poland", "UEFA"),
    ("Morocco", "CAF"),
    ("Senegal", "CAF"),
    ("Nigeria", "CAF"),
    ("Cameroon", "CAF"),
    ("Ghana", "CAF"),
    ("Japan", "AFC"),
    ("South Korea", "AFC"),
    ("Australia", "AFC"),
    ("Iran", "AFC"),
    ("Saudi Arabia", "AFC"),
    ("Mexico", "CONCACAF"),
    ("United States", "CONCACAF"),
    ("Canada", "CONCACAF"),
    ("Costa Rica", "CONCACAF"),
];

const FIRST_NAMES: &[&str] = &[
    "Luis", "Marco", "Ahmed", "Kenji", "Oliver", "Mateo", "Youssef", "Jonas", "Diego", "Lucas",
    "Pedro", "Ivan", "Samuel", "Emre", "Felipe", "Hugo", "Andre", "Kwame", "Tomas", "Min-jae",
    "Rafael", "Nico", "Ali", "Daniel", "Sergio", "Kevin", "Joao", "Erik", "Moussa", "Hiroki",
];

const SURNAMES: &[&str] = &[
    "Silva", "Muller", "Garcia", "Tanaka", "Mensah", "Rossi", "Dubois", "Novak", "Hernandez",
    "Kim", "Jensen", "Kowalski", "Diallo", "Santos", "Petrovic", "Fernandes", "Okafor", "Smith",
    "Van Dijk", "Moreno", "Haddad", "Lindqvist", "Costa", "Yilmaz", "Romero", "Suzuki", "Traore",
    "Martins", "Alvarez", "Weber",
];

const VENUES: &[&str] = &[
    "Estadio Central",
    "Harbour Arena",
    "National Stadium",
    "Riverside Park",
    "Olympic Ground",
    "North Bowl",
    "Capital Field",
    "Lakeside Stadium",
];

const REFEREES: &[&str] = &[
    "A. Marciniak",
    "D. Makkelie",
    "C. Turpin",
    "W. Sampaio",
    "F. Tello",
    "M. Oliver",
    "S. Vincic",
    "I. Kovacs",
];

/// Starting XI in a 4-4-2, shirts 1 to 11.
const STARTING_SHAPE: [Position; 11] = [
    Position::Goalkeeper,
    Position::Defender,
    Position::Defender,
    Position::Defender,
    Position::Defender,
    Position::Midfielder,
    Position::Midfielder,
    Position::Midfielder,
    Position::Midfielder,
    Position::Forward,
    Position::Forward,
];

/// Bench, shirts 12 to 22.
const BENCH_SHAPE: [Position; 11] = [
    Position::Goalkeeper,
    Position::Defender,
    Position::Defender,
    Position::Defender,
    Position::Midfielder,
    Position::Midfielder,
    Position::Midfielder,
    Position::Midfielder,
    Position::Forward,
    Position::Forward,
    Position::Forward,
];

fn player_name<R: Rng + ?Sized>(rng: &mut R) -> String {
    let first = FIRST_NAMES[rng.gen_range(0..FIRST_NAMES.len())];
    let last = SURNAMES[rng.gen_range(0..SURNAMES.len())];
    format!("{first} {last}")
}

/// Build a 22-player squad: a full 4-4-2 XI and an 11-man bench.
pub fn build_squad<R: Rng + ?Sized>(rng: &mut R, name: &str, region: &str) -> Result<Team, RosterError> {
    let mut team = Team::new(name, region);
    for (i, pos) in STARTING_SHAPE.iter().enumerate() {
        team.add_starting_player(Player::new(player_name(rng), i as u8 + 1, *pos))?;
    }
    for (i, pos) in BENCH_SHAPE.iter().enumerate() {
        team.add_substitute_player(Player::new(player_name(rng), i as u8 + 12, *pos))?;
    }
    Ok(team)
}

/// Shuffle the nations into eight groups of four (A to H) and give every
/// team a squad.
pub fn draw_groups<R: Rng + ?Sized>(rng: &mut R) -> Result<Vec<(char, Vec<Team>)>, RosterError> {
    let mut nations = NATIONS.to_vec();
    nations.shuffle(rng);

    GROUP_LETTERS
        .iter()
        .zip(nations.chunks(GROUP_SIZE))
        .map(|(&letter, chunk)| {
            let teams = chunk
                .iter()
                .map(|(name, region)| build_squad(rng, name, region))
                .collect::<Result<Vec<_>, _>>()?;
            Ok((letter, teams))
        })
        .collect()
}

pub fn venues() -> Vec<String> {
    VENUES.iter().map(|v| v.to_string()).collect()
}

pub fn referees() -> Vec<String> {
    REFEREES.iter().map(|r| r.to_string()).collect()
}
