//! Interactive conversion session.

use std::str::FromStr;

use hopfx_fx::{FxError, RateResolver};
use rust_decimal::Decimal;
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, Lines};
use tracing::debug;

/// Input problems handled by re-prompting.
#[derive(Debug, Error)]
pub enum PromptError {
    #[error("'{0}' is not a valid amount")]
    InvalidAmount(String),
}

/// Parse a user-entered amount.
pub fn parse_amount(text: &str) -> Result<Decimal, PromptError> {
    let text = text.trim();
    Decimal::from_str(text)
        .or_else(|_| Decimal::from_scientific(text))
        .map_err(|_| PromptError::InvalidAmount(text.to_string()))
}

/// Counters for a finished session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionSummary {
    /// Conversions answered with a rate.
    pub conversions: u64,
    /// Conversions answered with the zero sentinel.
    pub misses: u64,
}

/// Reads queries line by line and writes results until EOF or `quit`.
pub struct Session<'a, R, W> {
    resolver: &'a RateResolver,
    lines: Lines<R>,
    output: W,
    summary: SessionSummary,
}

impl<'a, R, W> Session<'a, R, W>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    pub fn new(resolver: &'a RateResolver, input: R, output: W) -> Self {
        Self {
            resolver,
            lines: input.lines(),
            output,
            summary: SessionSummary::default(),
        }
    }

    /// Run until the input ends or the user quits.
    pub async fn run(mut self) -> std::io::Result<SessionSummary> {
        loop {
            let Some(base) = self.read_currency("Base currency: ").await? else {
                break;
            };
            let Some(target) = self.read_currency("Target currency: ").await? else {
                break;
            };
            let Some(amount) = self.read_amount().await? else {
                break;
            };

            self.answer(&base, &target, amount).await?;
        }

        self.output.flush().await?;
        Ok(self.summary)
    }

    async fn answer(&mut self, base: &str, target: &str, amount: Decimal) -> std::io::Result<()> {
        let line = match self.resolver.try_convert(base, target, amount).await {
            Ok(conversion) => {
                self.summary.conversions += 1;
                format!("{} = {} ({})", conversion.input, conversion.output, conversion.path)
            }
            Err(e @ FxError::Source(_)) => {
                self.summary.misses += 1;
                format!("{} {} = 0 {} (rates unavailable: {})", amount.normalize(), base, target, e)
            }
            Err(e) => {
                self.summary.misses += 1;
                format!("{} {} = 0 {} ({})", amount.normalize(), base, target, e)
            }
        };

        self.output.write_all(line.as_bytes()).await?;
        self.output.write_all(b"\n").await
    }

    /// Prompt and read one line. `None` on EOF or a quit command.
    async fn prompt(&mut self, label: &str) -> std::io::Result<Option<String>> {
        self.output.write_all(label.as_bytes()).await?;
        self.output.flush().await?;

        let Some(line) = self.lines.next_line().await? else {
            return Ok(None);
        };
        let line = line.trim().to_string();
        if matches!(line.as_str(), "quit" | "exit") {
            return Ok(None);
        }
        Ok(Some(line))
    }

    async fn read_currency(&mut self, label: &str) -> std::io::Result<Option<String>> {
        loop {
            match self.prompt(label).await? {
                Some(code) if code.is_empty() => continue,
                other => return Ok(other),
            }
        }
    }

    async fn read_amount(&mut self) -> std::io::Result<Option<Decimal>> {
        loop {
            let Some(text) = self.prompt("Amount: ").await? else {
                return Ok(None);
            };
            match parse_amount(&text) {
                Ok(amount) => return Ok(Some(amount)),
                Err(e) => {
                    debug!(input = %text, "Rejected amount");
                    let message = format!("{}, please enter a number\n", e);
                    self.output.write_all(message.as_bytes()).await?;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hopfx_fx::SeedRateSource;
    use rust_decimal_macros::dec;
    use std::sync::Arc;

    async fn run_session(input: &str) -> (String, SessionSummary) {
        let resolver = RateResolver::new(Arc::new(SeedRateSource::instant()));
        let mut output = Vec::new();

        let summary = Session::new(&resolver, input.as_bytes(), &mut output)
            .run()
            .await
            .unwrap();

        (String::from_utf8(output).unwrap(), summary)
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount(" 1000 ").unwrap(), dec!(1000));
        assert_eq!(parse_amount("12.50").unwrap(), dec!(12.5));
        assert_eq!(parse_amount("1e3").unwrap(), dec!(1000));
        assert!(matches!(parse_amount("ten"), Err(PromptError::InvalidAmount(_))));
        assert!(parse_amount("").is_err());
    }

    #[tokio::test]
    async fn test_direct_conversion() {
        let (output, summary) = run_session("DZD\nEUR\n1000\n").await;

        assert!(output.contains("1000 DZD = 6.9 EUR (direct)"));
        assert_eq!(summary.conversions, 1);
        assert_eq!(summary.misses, 0);
    }

    #[tokio::test]
    async fn test_composed_conversion() {
        let (output, _) = run_session("DZD\nUSD\n1000\n").await;
        assert!(output.contains("1000 DZD = 7.314 USD (via EUR)"));
    }

    #[tokio::test]
    async fn test_missing_rate_prints_zero() {
        let (output, summary) = run_session("USD\nGBP\n100\n").await;

        assert!(output.contains("100 USD = 0 GBP (No rate found for USD/GBP)"));
        assert_eq!(summary.misses, 1);
    }

    #[tokio::test]
    async fn test_huge_amount_prints_zero() {
        let (output, summary) = run_session("USD\nDZD\n1000000000000000000000000000\n").await;

        assert!(output.contains(
            "1000000000000000000000000000 USD = 0 DZD (Conversion overflow for USD/DZD)"
        ));
        assert_eq!(summary.misses, 1);
    }

    #[test]
    fn test_parse_negative_amount() {
        assert_eq!(parse_amount("-5").unwrap(), dec!(-5));
    }

    #[tokio::test]
    async fn test_invalid_amount_reprompts() {
        let (output, summary) = run_session("EUR\nUSD\nabc\n10\nquit\n").await;

        assert!(output.contains("'abc' is not a valid amount, please enter a number"));
        assert!(output.contains("10 EUR = 10.6 USD (direct)"));
        assert_eq!(output.matches("Amount: ").count(), 2);
        assert_eq!(summary.conversions, 1);
    }

    #[tokio::test]
    async fn test_empty_currency_reprompts() {
        let (output, _) = run_session("\n  \nEUR\nGBP\n2\n").await;

        assert_eq!(output.matches("Base currency: ").count(), 4);
        assert!(output.contains("2 EUR = 1.7 GBP (direct)"));
    }

    #[tokio::test]
    async fn test_quit_ends_session() {
        let (output, summary) = run_session("exit\nEUR\nUSD\n10\n").await;

        assert_eq!(output, "Base currency: ");
        assert_eq!(summary, SessionSummary::default());
    }
}
