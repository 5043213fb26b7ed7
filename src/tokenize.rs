use crate::error::TalusError;

/// Splits a raw command line into tokens using POSIX shell quoting rules.
pub fn tokenize(raw: &str) -> Result<Vec<String>, TalusError> {
    shell_words::split(raw).map_err(|error| TalusError::MalformedArguments {
        message: format!("{error} in {raw:?}"),
    })
}

/// Quotes tokens back into a single line that [`tokenize`] splits identically.
pub fn join<I, S>(tokens: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    shell_words::join(tokens)
}
