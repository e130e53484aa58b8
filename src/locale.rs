use clap::ValueEnum;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
pub enum Language { Sv, En }

impl Language {
    /// BCP 47 tag used for the document `lang` attribute and locale-aware
    /// sorting in the embedded script.
    pub fn tag(self) -> &'static str {
        match self { Language::Sv => "sv", Language::En => "en" }
    }
}

/// Every user-facing string in the report goes through this catalog.
/// The match below is total: adding a label without both translations
/// does not compile.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Label {
    Id,
    Title,
    AffectedUser,
    AssignedTo,
    Created,
    Status,
    Classification,
    TierQueue,
    RelatedItems,
    Details,
    ShowAll,
    ExpandAll,
    CollapseAll,
    Generated,
    OpenIncidents,
    DefaultTitle,
}

impl Label {
    pub fn text(self, lang: Language) -> &'static str {
        match (self, lang) {
            (Label::Id, _) => "Id",
            (Label::Title, Language::Sv) => "Rubrik",
            (Label::Title, Language::En) => "Title",
            (Label::AffectedUser, Language::Sv) => "Berörd användare",
            (Label::AffectedUser, Language::En) => "Affected user",
            (Label::AssignedTo, Language::Sv) => "Tilldelad till",
            (Label::AssignedTo, Language::En) => "Assigned to",
            (Label::Created, Language::Sv) => "Skapad",
            (Label::Created, Language::En) => "Created",
            (Label::Status, _) => "Status",
            (Label::Classification, Language::Sv) => "Klassificering",
            (Label::Classification, Language::En) => "Classification",
            (Label::TierQueue, Language::Sv) => "Supportgrupp",
            (Label::TierQueue, Language::En) => "Support group",
            (Label::RelatedItems, Language::Sv) => "Relaterade objekt",
            (Label::RelatedItems, Language::En) => "Related items",
            (Label::Details, Language::Sv) => "Detaljer",
            (Label::Details, Language::En) => "Details",
            (Label::ShowAll, Language::Sv) => "Visa alla",
            (Label::ShowAll, Language::En) => "Show all",
            (Label::ExpandAll, Language::Sv) => "Expandera alla",
            (Label::ExpandAll, Language::En) => "Expand all",
            (Label::CollapseAll, Language::Sv) => "Fäll ihop alla",
            (Label::CollapseAll, Language::En) => "Collapse all",
            (Label::Generated, Language::Sv) => "genererad",
            (Label::Generated, Language::En) => "generated",
            (Label::OpenIncidents, Language::Sv) => "öppna incidenter",
            (Label::OpenIncidents, Language::En) => "open incidents",
            (Label::DefaultTitle, Language::Sv) => "Öppna incidenter",
            (Label::DefaultTitle, Language::En) => "Open incidents",
        }
    }
}
