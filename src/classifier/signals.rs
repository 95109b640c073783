//! Default signal vocabularies and boundary-aware term matching
//!
//! Lists carry Portuguese and English terms side by side. All terms are
//! stored lowercase and matched against lowercased text.

/// Title markers that rule a page out before any other signal is read
pub const TITLE_EXCLUSIONS: &[&str] = &[
    // namespaces
    "categoria:",
    "category:",
    "anexo:",
    "portal:",
    "predefinição:",
    "template:",
    "ficheiro:",
    "file:",
    "ajuda:",
    "help:",
    "wikipédia:",
    "wikipedia:",
    "especial:",
    "special:",
    "mediawiki:",
    // listings
    "lista de",
    "list of",
    "nascidos em",
    "mortes em",
    "births in",
    "deaths in",
    "bibliografia",
    "bibliography",
    "cronologia",
    "timeline of",
    "discografia",
    "discography",
    // topical nouns
    "guerra",
    "war",
    "batalha",
    "battle",
    "revolução",
    "revolution",
    "cidade",
    "city",
    "município",
    "municipality",
    "país",
    "country",
    "empresa",
    "company",
    "organização",
    "organization",
    "universidade",
    "university",
    "escola",
    "school",
    "hospital",
    "museu",
    "museum",
    "clube",
    "club",
    "rio",
    "river",
    "montanha",
    "mountain",
    "filme",
    "film",
    "álbum",
    "album",
    "telenovela",
    "canção",
    "song",
    "campeonato",
    "championship",
    "eleição",
    "election",
];

/// Panel field names that affirm a person, weight 1
pub const AFFIRMING_FIELDS: &[&str] = &[
    "nascimento:",
    "nome completo:",
    "nome de nascimento:",
    "morte:",
    "falecimento:",
    "cônjuge:",
    "esposa:",
    "esposo:",
    "marido:",
    "filhos:",
    "filho(a)s:",
    "progenitores:",
    "ocupação:",
    "profissão:",
    "born:",
    "birth name:",
    "full name:",
    "died:",
    "spouse:",
    "spouse(s):",
    "children:",
    "parents:",
    "occupation:",
    "occupation(s):",
    "profession:",
];

/// Panel field names that lean towards a person, weight 0.5
pub const WEAK_AFFIRMING_FIELDS: &[&str] = &[
    "nacionalidade:",
    "cidadania:",
    "natural de:",
    "formação:",
    "alma mater:",
    "conhecido por:",
    "conhecido(a) por:",
    "pseudônimo:",
    "nome artístico:",
    "nationality:",
    "citizenship:",
    "education:",
    "known for:",
    "pseudonym:",
];

/// Panel field names that rule out a person outright
pub const NEGATING_FIELDS: &[&str] = &[
    "fundação:",
    "fundado:",
    "fundada:",
    "criação:",
    "sede:",
    "população:",
    "área:",
    "território:",
    "gênero musical:",
    "editora:",
    "lançamento:",
    "duração:",
    "formato:",
    "founded:",
    "founding:",
    "headquarters:",
    "population:",
    "area:",
    "genre:",
    "label:",
    "released:",
    "release date:",
    "length:",
    "format:",
];

/// Profession nouns recognised after a biographical copula
pub const PROFESSIONS: &[&str] = &[
    "ator",
    "atriz",
    "político",
    "política",
    "escritor",
    "escritora",
    "cantor",
    "cantora",
    "compositor",
    "compositora",
    "músico",
    "musicista",
    "jogador",
    "jogadora",
    "futebolista",
    "atleta",
    "cientista",
    "médico",
    "médica",
    "advogado",
    "advogada",
    "jornalista",
    "apresentador",
    "apresentadora",
    "diretor",
    "diretora",
    "produtor",
    "produtora",
    "pintor",
    "pintora",
    "poeta",
    "poetisa",
    "filósofo",
    "filósofa",
    "empresário",
    "empresária",
    "engenheiro",
    "engenheira",
    "arquiteto",
    "arquiteta",
    "professor",
    "professora",
    "economista",
    "historiador",
    "historiadora",
    "militar",
    "actor",
    "actress",
    "politician",
    "writer",
    "singer",
    "songwriter",
    "composer",
    "musician",
    "player",
    "footballer",
    "athlete",
    "scientist",
    "physician",
    "lawyer",
    "journalist",
    "presenter",
    "director",
    "producer",
    "painter",
    "poet",
    "philosopher",
    "businessman",
    "businesswoman",
    "engineer",
    "architect",
    "economist",
    "historian",
];

/// Returns true when `term` occurs in `haystack` on word boundaries
///
/// A boundary is only required on a side where the term itself starts or ends
/// with an alphanumeric character, so `"categoria:"` matches inside
/// `"categoria:brasileiros"` while `"war"` does not match inside `"edward"`.
pub fn contains_term(haystack: &str, term: &str) -> bool {
    if term.is_empty() {
        return false;
    }

    let check_before = term.chars().next().is_some_and(char::is_alphanumeric);
    let check_after = term.chars().last().is_some_and(char::is_alphanumeric);

    haystack.match_indices(term).any(|(start, _)| {
        let end = start + term.len();

        let before_ok = !check_before
            || haystack[..start]
                .chars()
                .next_back()
                .map_or(true, |c| !c.is_alphanumeric());

        let after_ok = !check_after
            || haystack[end..]
                .chars()
                .next()
                .map_or(true, |c| !c.is_alphanumeric());

        before_ok && after_ok
    })
}

/// Returns the first term of `terms` found in `haystack`
pub fn first_match<'a>(haystack: &str, terms: &'a [String]) -> Option<&'a str> {
    terms
        .iter()
        .find(|term| contains_term(haystack, term))
        .map(String::as_str)
}

/// Lowercases a configured override or the built-in default list
pub fn term_list(configured: Option<&Vec<String>>, default: &[&str]) -> Vec<String> {
    match configured {
        Some(list) => list.iter().map(|t| t.to_lowercase()).collect(),
        None => default.iter().map(|t| t.to_string()).collect(),
    }
}
