/// Provider team name to the name shown in announcements.
const LOCAL_NAMES: &[(&str, &str)] = &[
    ("Panathinaikos", "ΠΑΝΑΘΗΝΑΪΚΟΣ"),
    ("Volos Nps", "ΒΟΛΟΣ ΝΠΣ"),
    ("Kifisia", "ΚΗΦΙΣΙΑ"),
    ("Atromitos", "ΑΤΡΟΜΗΤΟΣ ΑΘ."),
    ("Aris Thessaloniki FC", "ΑΡΗΣ"),
    ("Olympiacos", "ΟΛΥΜΠΙΑΚΟΣ"),
    ("Levadiakos", "ΛΕΒΑΔΕΙΑΚΟΣ"),
    ("AE Larissa", "Α.Ε.Λ."),
    ("PAOK Thessaloniki FC", "Π.Α.Ο.Κ."),
    ("Panserraikos FC", "ΠΑΝΣΕΡΡΑΪΚΟΣ"),
    ("Panetolikos", "ΠΑΝΑΙΤΩΛΙΚΟΣ"),
    ("AEK Athens", "Α.Ε.Κ."),
    ("OFI Crete", "Ο.Φ.Η."),
    ("Asteras Tripolis", "ASTERAS AKTOR"),
];

/// Provider team name to the club's community page.
const COMMUNITY_LINKS: &[(&str, &str)] = &[
    ("AEK Athens", "https://www.reddit.com/r/AEKAthensFC/"),
    ("Panathinaikos", "https://www.reddit.com/r/Panathinaikos/"),
    ("Olympiacos", "https://www.reddit.com/r/OlympiakosFC/"),
    ("PAOK Thessaloniki FC", "https://www.reddit.com/r/PAOK/"),
    ("Aris Thessaloniki FC", "https://www.reddit.com/r/ARIS/"),
];

fn lookup(table: &[(&str, &str)], team: &str) -> Option<String> {
    table
        .iter()
        .find(|(name, _)| *name == team)
        .map(|(_, value)| value.to_string())
}

/// Localised display name for a provider team name.
pub fn local_name(team: &str) -> Option<String> {
    lookup(LOCAL_NAMES, team)
}

/// Community link for a provider team name.
pub fn community_link(team: &str) -> Option<String> {
    lookup(COMMUNITY_LINKS, team)
}
