use std::fmt::{self, Display};

#[derive(Default, PartialEq)]
pub struct Includes {
    custom: Vec<String>,
    pub compare: bool,
    pub cstddef: bool,
    pub utility: bool,
}

impl Includes {
    pub fn new() -> Self {
        Includes::default()
    }

    pub fn insert(&mut self, include: String) {
        if !self.custom.contains(&include) {
            self.custom.push(include);
        }
    }
}

impl Extend<String> for Includes {
    fn extend<I: IntoIterator<Item = String>>(&mut self, iter: I) {
        for include in iter {
            self.insert(include);
        }
    }
}

impl Display for Includes {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for include in &self.custom {
            if include.starts_with('<') && include.ends_with('>') {
                writeln!(f, "#include {}", include)?;
            } else {
                writeln!(f, "#include \"{}\"", include.escape_default())?;
            }
        }
        if self.compare {
            writeln!(f, "#include <compare>")?;
        }
        if self.cstddef {
            writeln!(f, "#include <cstddef>")?;
        }
        if self.utility {
            writeln!(f, "#include <utility>")?;
        }
        if *self != Self::default() {
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::Includes;

    #[test]
    fn test_order() {
        let mut include = Includes::new();
        include.insert("<SDL3/SDL_video.h>".to_owned());
        include.extend(["SDL_rect.hpp".to_owned(), "SDL_rect.hpp".to_owned()]);
        include.utility = true;
        include.compare = true;
        assert_eq!(
            include.to_string(),
            "#include <SDL3/SDL_video.h>\n#include \"SDL_rect.hpp\"\n#include <compare>\n#include <utility>\n\n",
        );
    }
}
