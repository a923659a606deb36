#[rocket::launch]
fn rocket() -> _ {
    business_health::build()
}
