use pyo3_stub_gen::Result;

fn main() -> Result<()> {
    let stub = nearest_latlon::stub_info()?;
    stub.generate()?;
    Ok(())
}
