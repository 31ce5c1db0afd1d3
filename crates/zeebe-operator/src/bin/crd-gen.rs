//! Print the Zeebe CRD manifest.

fn main() -> anyhow::Result<()> {
    print!("{}", zeebe_operator::crd_yaml()?);
    Ok(())
}
