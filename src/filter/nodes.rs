use super::FilterSet;

/// Plain ordered token list; duplicates are kept as entered.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NodesFilter {
    tokens: Vec<String>,
}

impl FilterSet for NodesFilter {
    fn add_value(&mut self, token: &str) {
        self.tokens.push(token.to_owned());
    }

    fn remove_value(&mut self, token: &str) {
        if let Some(position) = self.tokens.iter().position(|stored| stored == token) {
            self.tokens.remove(position);
        }
    }

    fn tokens(&self) -> impl Iterator<Item = &str> {
        self.tokens.iter().map(String::as_str)
    }
}
