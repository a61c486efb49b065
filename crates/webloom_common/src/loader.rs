/// How a source unit gets parsed and transformed, derived from its extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Loader {
  Js,
  Jsx,
  Ts,
  Tsx,
  Css,
}

impl Loader {
  pub fn from_path(path: &str) -> Self {
    let ext = path.rsplit('.').next().unwrap_or("");
    match ext {
      "ts" => Self::Ts,
      "tsx" => Self::Tsx,
      "jsx" => Self::Jsx,
      "css" | "scss" | "sass" => Self::Css,
      _ => Self::Js,
    }
  }

  pub fn is_css(&self) -> bool {
    matches!(self, Self::Css)
  }

  pub fn is_typescript(&self) -> bool {
    matches!(self, Self::Ts | Self::Tsx)
  }

  pub fn is_jsx(&self) -> bool {
    matches!(self, Self::Jsx | Self::Tsx)
  }
}
