use serde::{Deserialize, Serialize};

/// A bookable salon offering: who it is aimed at and what it includes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Service {
    pub id: String,
    pub clientele: Clientele,
    pub washing: bool,
    pub cutting: bool,
    pub coloring: bool,
}

impl Service {
    pub fn flags(&self) -> ServiceFlags {
        ServiceFlags {
            washing: self.washing,
            cutting: self.cutting,
            coloring: self.coloring,
        }
    }

    /// Human label used in notifications and the ICS summary.
    pub fn label(&self) -> String {
        let mut parts = vec![];
        if self.washing {
            parts.push("wash");
        }
        if self.cutting {
            parts.push("cut");
        }
        if self.coloring {
            parts.push("color");
        }
        format!("{} {}", self.clientele.as_str(), parts.join(" + "))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Clientele {
    Male,
    Female,
    Unisex,
}

impl Clientele {
    pub fn as_str(&self) -> &'static str {
        match self {
            Clientele::Male => "male",
            Clientele::Female => "female",
            Clientele::Unisex => "unisex",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "male" => Some(Clientele::Male),
            "female" => Some(Clientele::Female),
            "unisex" => Some(Clientele::Unisex),
            _ => None,
        }
    }
}

/// The capability triple a customer asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceFlags {
    pub washing: bool,
    pub cutting: bool,
    pub coloring: bool,
}

impl ServiceFlags {
    pub fn none_requested(&self) -> bool {
        !self.washing && !self.cutting && !self.coloring
    }

    /// True if `self` offers everything in `requested`.
    pub fn covers(&self, requested: &ServiceFlags) -> bool {
        (self.washing || !requested.washing)
            && (self.cutting || !requested.cutting)
            && (self.coloring || !requested.coloring)
    }
}
