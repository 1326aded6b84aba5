use plasma_util_error::WhateverResult;

#[tokio::main]
#[snafu::report]
async fn main() -> WhateverResult<()> {
    plasma::run().await
}
