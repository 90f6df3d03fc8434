// Suggested actions shown to teachers on the entry form.
// Entries are not restricted to this list; the label is free text.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ActionPreset {
    pub action: &'static str,
    pub points: i64,
}

const fn preset(action: &'static str, points: i64) -> ActionPreset {
    ActionPreset { action, points }
}

pub const ACTION_PRESETS: &[ActionPreset] = &[
    // Actions that add points
    preset("emprunter un livre au CDI", 50),
    preset("aucun oubli sur une semaine", 10),
    preset("comportement positif sur une semaine", 10),
    preset("résolution de conflit", 50),
    preset("effort sur le trimestre", 100),
    preset("gagne un défi versus un enseignant", 50),
    preset("carnet à jour", 10),
    preset("entraide entre élèves", 50),
    preset("écrire un message Arsène sans fautes d'orthographe", 10),
    preset("meilleur cookie", 200),
    preset("gouter d'anniversaire", 50),
    // Actions that remove points
    preset("oubli (travail, livre, tenue)", -50),
    preset("comportement (insolence, attitude, etc)", -100),
    preset("violence", -100),
    preset("refuser d'essayer", -50),
    preset("carnet non à jour", -50),
    preset("perds le défi contre un enseignant", -50),
    preset("écrire un message Arsène avec des fautes d'orthographe", -10),
];
